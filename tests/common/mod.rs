#![allow(dead_code)]

use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use camino::{Utf8Path, Utf8PathBuf};
use magdecl::{CancelHandle, MagDeclError, ModelPrediction, ModelQuery, ModelService};

pub const OBSERVATORY_DIR: &str = "tests/data/observatory";
pub const STATION_A: &str = "tests/data/observatory/aaa20210411vmin.min";
pub const STATION_B: &str = "tests/data/observatory/bbb20210411vmin.min";
pub const ORBIT_PASS: &str = "tests/data/orbit/pass_20210411.csv";

/// Always predicts the same declination, counting calls and peak concurrency.
#[derive(Debug, Default)]
pub struct ConstantModel {
    pub declination: f64,
    pub delay: Duration,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub queries: Mutex<Vec<ModelQuery>>,
}

impl ConstantModel {
    pub fn new(declination: f64) -> Self {
        ConstantModel {
            declination,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelService for ConstantModel {
    fn predict(
        &self,
        query: ModelQuery,
    ) -> impl Future<Output = Result<ModelPrediction, MagDeclError>> + Send {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(ModelPrediction {
                declination: self.declination,
            })
        }
    }
}

/// Fails for the queries at a given latitude, predicts 4.0 elsewhere.
#[derive(Debug)]
pub struct FailingModel {
    pub fail_latitude: f64,
}

impl ModelService for FailingModel {
    fn predict(
        &self,
        query: ModelQuery,
    ) -> impl Future<Output = Result<ModelPrediction, MagDeclError>> + Send {
        let fail = query.latitude == self.fail_latitude;
        async move {
            if fail {
                Err(MagDeclError::ModelStatus {
                    status: 503,
                    body: "service unavailable".into(),
                })
            } else {
                Ok(ModelPrediction { declination: 4.0 })
            }
        }
    }
}

/// Panics for the queries at a given latitude, predicts 4.0 elsewhere.
#[derive(Debug)]
pub struct PanickingModel {
    pub panic_latitude: f64,
}

impl ModelService for PanickingModel {
    fn predict(
        &self,
        query: ModelQuery,
    ) -> impl Future<Output = Result<ModelPrediction, MagDeclError>> + Send {
        let panics = query.latitude == self.panic_latitude;
        async move {
            if panics {
                panic!("model crashed at latitude {}", query.latitude);
            }
            Ok(ModelPrediction { declination: 4.0 })
        }
    }
}

/// Cancels the run on its first call, then answers normally.
#[derive(Debug)]
pub struct CancellingModel {
    pub handle: CancelHandle,
}

impl ModelService for CancellingModel {
    fn predict(
        &self,
        _query: ModelQuery,
    ) -> impl Future<Output = Result<ModelPrediction, MagDeclError>> + Send {
        self.handle.cancel();
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(ModelPrediction { declination: 1.0 })
        }
    }
}

/// Write a minimal IAGA-2002 file with a `D` column.
pub fn write_d_file(dir: &Utf8Path, name: &str, code: &str, date: &str, doy: u16, values: &[f64]) -> Utf8PathBuf {
    let mut content = format!(
        " Station Name           {code} test station                                 |
 IAGA Code              {code}                                          |
 Geodetic Latitude      10.0                                         |
 Geodetic Longitude     20.0                                         |
 Elevation              0                                            |
DATE       TIME         DOY     {code}D   |
"
    );
    for (minute, value) in values.iter().enumerate() {
        content.push_str(&format!("{date} 00:{minute:02}:00.000 {doy}     {value:.2}\n"));
    }
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
