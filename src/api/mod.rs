use std::fs;
use std::io::{self, Read};
use std::net::SocketAddr;

use axum::{
    Router,
    extract::{Json, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{CalcError, InputMap, Meta, builtin};

#[derive(Parser, Debug)]
#[command(
    name = "fincalc",
    about = "Financial calculators (ROI, mortgages, PMI, property tax, escrow, stock options)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every registered calculator.
    List,
    /// Print a calculator's inputs, outputs and examples as JSON.
    Describe { id: String },
    /// Run a calculator on a JSON input object.
    Calculate {
        id: String,
        #[arg(long, default_value = "-", help = "Input JSON file, or - for stdin")]
        input: String,
        #[arg(long, help = "Print only the Markdown report")]
        report: bool,
    },
    /// Validate a JSON input object without calculating.
    Validate {
        id: String,
        #[arg(long, default_value = "-", help = "Input JSON file, or - for stdin")]
        input: String,
    },
    /// Serve the HTTP API.
    Serve {
        #[arg(long, env = "FINCALC_PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Calc(#[from] CalcError),
    #[error("{0} validation error(s)")]
    Invalid(usize),
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let registry = builtin();
    match cli.command {
        Command::List => {
            for r in registry.iter() {
                println!("{:<24} {:<10} {}", r.id(), r.meta.subcategory, r.meta.title);
            }
        }
        Command::Describe { id } => {
            let info = registry.lookup(&id)?.describe();
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Calculate { id, input, report } => {
            let inputs = read_input(&input)?;
            let response = registry.calculate(&id, &inputs)?;
            if report {
                print!("{}", response.report);
            } else {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
        Command::Validate { id, input } => {
            let inputs = read_input(&input)?;
            let result = registry.validate(&id, &inputs, None)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_valid {
                return Err(CliError::Invalid(result.errors.len()));
            }
        }
        Command::Serve { port } => run_http_server(port).await?,
    }
    Ok(())
}

fn read_input(source: &str) -> Result<InputMap, CliError> {
    let raw = if source == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(source)?
    };
    parse_input_object(&raw)
}

fn parse_input_object(raw: &str) -> Result<InputMap, CliError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::NotAnObject),
    }
}

#[derive(Debug, Deserialize)]
struct ValidatePayload {
    #[serde(default)]
    inputs: InputMap,
    #[serde(default)]
    context: Option<InputMap>,
}

#[derive(Debug, Deserialize)]
struct QuickValidatePayload {
    field: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    inputs: InputMap,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/calculators", get(list_handler))
        .route("/api/calculators/:id", get(describe_handler))
        .route("/api/calculators/:id/validate", post(validate_handler))
        .route(
            "/api/calculators/:id/quick-validate",
            post(quick_validate_handler),
        )
        .route("/api/calculators/:id/calculate", post(calculate_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, calculators = builtin().len(), "fincalc HTTP API listening");
    axum::serve(listener, router()).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn list_handler() -> Response {
    let metas: Vec<Meta> = builtin().iter().map(|r| r.meta).collect();
    json_response(StatusCode::OK, metas)
}

async fn describe_handler(Path(id): Path<String>) -> Response {
    match builtin().lookup(&id) {
        Ok(registration) => json_response(StatusCode::OK, registration.describe()),
        Err(err) => calc_error_response(err),
    }
}

async fn validate_handler(
    Path(id): Path<String>,
    Json(payload): Json<ValidatePayload>,
) -> Response {
    match builtin().validate(&id, &payload.inputs, payload.context.as_ref()) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => calc_error_response(err),
    }
}

async fn quick_validate_handler(
    Path(id): Path<String>,
    Json(payload): Json<QuickValidatePayload>,
) -> Response {
    match builtin().quick_validate(&id, &payload.field, &payload.value, &payload.inputs) {
        Ok(check) => json_response(StatusCode::OK, check),
        Err(err) => calc_error_response(err),
    }
}

async fn calculate_handler(Path(id): Path<String>, Json(inputs): Json<InputMap>) -> Response {
    match builtin().calculate(&id, &inputs) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => calc_error_response(err),
    }
}

fn calc_error_response(err: CalcError) -> Response {
    let status = match err {
        CalcError::UnknownCalculator(_) => StatusCode::NOT_FOUND,
        CalcError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CalcError::InvalidInput(_) | CalcError::PropertyTax(_) => StatusCode::BAD_REQUEST,
    };
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    fn object(value: Value) -> InputMap {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["fincalc", "calculate", "escrow-analysis", "--input", "in.json"])
            .expect("parses");
        match cli.command {
            Command::Calculate { id, input, report } => {
                assert_eq!(id, "escrow-analysis");
                assert_eq!(input, "in.json");
                assert!(!report);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["fincalc", "serve", "--port", "9000"]).expect("parses");
        assert!(matches!(cli.command, Command::Serve { port: 9000 }));
    }

    #[test]
    fn input_must_be_an_object() {
        assert!(matches!(parse_input_object("[1, 2]"), Err(CliError::NotAnObject)));
        assert!(matches!(parse_input_object("{"), Err(CliError::Json(_))));
        let map = parse_input_object(r#"{"strikePrice": 100}"#).expect("object");
        assert_eq!(map["strikePrice"], json!(100));
    }

    #[tokio::test]
    async fn list_includes_every_family() {
        let response = list_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let body = body_json(response).await;
        let ids: Vec<_> = body
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|m| m["id"].as_str())
            .collect();
        assert!(ids.contains(&"stock-options"));
        assert!(ids.contains(&"property-tax-proration"));
    }

    #[tokio::test]
    async fn describe_unknown_calculator_is_404() {
        let response = describe_handler(Path("nope".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("unknown calculator: nope"));
    }

    #[tokio::test]
    async fn describe_lists_schema_and_examples() {
        let response = describe_handler(Path("escrow-analysis".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], json!("escrow-analysis"));
        assert!(body["inputs"].as_array().is_some_and(|a| !a.is_empty()));
        assert!(body["examples"].as_array().is_some_and(|a| !a.is_empty()));
    }

    #[tokio::test]
    async fn calculate_returns_output_and_report() {
        let inputs = object(json!({
            "annualPropertyTax": 3600,
            "salePrice": 450000,
            "closingDate": "2024-06-15",
            "taxYearStart": "2024-01-01",
            "taxYearEnd": "2024-12-31"
        }));
        let response = calculate_handler(Path("property-tax-proration".to_string()), Json(inputs)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["calculatorId"], json!("property-tax-proration"));
        assert_eq!(body["output"]["sellerTaxResponsibility"], json!(1647.12));
        assert!(body["report"].as_str().is_some_and(|r| r.starts_with("# Property Tax Analysis")));
    }

    #[tokio::test]
    async fn hard_errors_are_400() {
        let inputs = object(json!({
            "annualPropertyTax": 3600,
            "salePrice": 450000,
            "closingDate": "2025-06-15",
            "taxYearStart": "2024-01-01",
            "taxYearEnd": "2024-12-31"
        }));
        let response = calculate_handler(Path("property-tax-proration".to_string()), Json(inputs)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn validate_and_quick_validate_report_issues() {
        let payload = ValidatePayload {
            inputs: object(json!({"optionType": "call"})),
            context: None,
        };
        let response = validate_handler(Path("stock-options".to_string()), Json(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["isValid"], json!(false));
        assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()));

        let payload = QuickValidatePayload {
            field: "volatility".to_string(),
            value: json!(900),
            inputs: InputMap::new(),
        };
        let response =
            quick_validate_handler(Path("stock-options".to_string()), Json(payload)).await;
        let body = body_json(response).await;
        assert_eq!(body["isValid"], json!(false));
        assert_eq!(body["message"], json!("Volatility must be between 0.1% and 500%"));
    }
}
