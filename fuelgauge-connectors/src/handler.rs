//! Point query handler
//!
//! Turns the query string a client sends into the response document:
//!
//! | Outcome                          | Result                                       |
//! |----------------------------------|----------------------------------------------|
//! | sample at or after the target    | `{"fuelLevel": 31.5, "message": null}`       |
//! | nothing at or after it that day  | `{"fuelLevel": 0, "message": "No Valid Data Available"}` |
//! | target does not parse            | `ConnectorError::BadRequest`                 |
//! | store failure                    | `ConnectorError::Store`                      |
//!
//! The handler is synchronous and cheap to clone; an HTTP layer can call it
//! from any worker.

use fuelgauge_core::{QueryEngine, QueryError, SampleStore};
use fuelgauge_schemas::schemas::fuel_level_response_v1;
use fuelgauge_schemas::FuelLevelResponse;

use crate::ConnectorError;

/// Answers fuel level queries
#[derive(Debug)]
pub struct FuelLevelHandler<S> {
    queries: QueryEngine<S>,
}

impl<S> Clone for FuelLevelHandler<S> {
    fn clone(&self) -> Self {
        Self { queries: self.queries.clone() }
    }
}

impl<S: SampleStore> FuelLevelHandler<S> {
    /// Handler over `queries`
    pub fn new(queries: QueryEngine<S>) -> Self {
        Self { queries }
    }

    /// Answer a `YYYY-MM-DD HH:MM:SS` query
    pub fn handle(&self, target: &str) -> Result<FuelLevelResponse, ConnectorError> {
        match self.queries.query_local(target) {
            Ok(hit) => {
                if hit.is_none() {
                    log::debug!("No fuel data at or after {}", target);
                }
                Ok(FuelLevelResponse::from(hit))
            }
            Err(QueryError::InvalidTarget(err)) => {
                Err(ConnectorError::BadRequest(format!("{}: {}", target, err)))
            }
            Err(QueryError::Store(err)) => Err(ConnectorError::Store(err)),
        }
    }

    /// [`handle`](Self::handle), rendered as JSON
    pub fn handle_json(&self, target: &str) -> Result<String, ConnectorError> {
        self.handle(target)?
            .to_json()
            .map_err(|e| ConnectorError::Transport(e.to_string()))
    }

    /// [`handle`](Self::handle), encoded as a `FuelLevelResponse` Avro datum
    pub fn handle_avro(&self, target: &str) -> Result<Vec<u8>, ConnectorError> {
        let schema =
            fuel_level_response_v1().map_err(|e| ConnectorError::Transport(e.to_string()))?;
        self.handle(target)?
            .to_avro(&schema)
            .map_err(|e| ConnectorError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelgauge_core::{EngineConfig, FuelGauge, MemoryStore, RawSample};
    use std::sync::Arc;

    fn handler_with(readings: &[(&str, u16)]) -> FuelLevelHandler<MemoryStore> {
        let gauge = FuelGauge::from_config(&EngineConfig::default(), Arc::new(MemoryStore::new()))
            .unwrap();
        for &(time, raw) in readings {
            let ts = gauge.zone().parse_query(time).unwrap();
            gauge.ingest(RawSample::new(ts, raw)).unwrap();
        }
        FuelLevelHandler::new(gauge.queries().clone())
    }

    #[test]
    fn answers_with_smoothed_level() {
        let handler = handler_with(&[
            ("2024-03-10 09:00:00", 5836),
            ("2024-03-10 10:00:00", 4464),
            ("2024-03-10 11:00:00", 2561),
        ]);

        assert_eq!(
            handler.handle_json("2024-03-10 10:30:00").unwrap(),
            r#"{"fuelLevel":31.5,"message":null}"#
        );
    }

    #[test]
    fn no_data_message() {
        let handler = handler_with(&[]);
        let response = handler.handle("2024-03-10 10:30:00").unwrap();
        assert_eq!(response, FuelLevelResponse::no_data());
        assert!(!response.has_data());
    }

    #[test]
    fn zero_liters_is_data() {
        let handler = handler_with(&[("2024-03-10 09:00:00", 6000)]);
        let response = handler.handle("2024-03-10 09:00:00").unwrap();
        assert_eq!(response, FuelLevelResponse::found(0.0));
    }

    #[test]
    fn malformed_target_is_bad_request() {
        let handler = handler_with(&[]);
        assert!(matches!(
            handler.handle("10:30 yesterday"),
            Err(ConnectorError::BadRequest(_))
        ));
    }

    #[test]
    fn avro_answer_decodes_to_same_response() {
        let handler = handler_with(&[("2024-03-10 09:00:00", 2561)]);
        let schema = fuel_level_response_v1().unwrap();

        let datum = handler.handle_avro("2024-03-10 08:00:00").unwrap();
        assert_eq!(
            FuelLevelResponse::from_avro(&schema, &datum).unwrap(),
            FuelLevelResponse::found(40.0)
        );

        let datum = handler.handle_avro("2024-03-10 10:00:00").unwrap();
        assert_eq!(
            FuelLevelResponse::from_avro(&schema, &datum).unwrap(),
            FuelLevelResponse::no_data()
        );
    }
}
