use std::process::ExitCode;

use fest_bracket_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> ExitCode {
    match ApiDoc::openapi().to_pretty_json() {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to serialize OpenAPI document: {err}");
            ExitCode::FAILURE
        }
    }
}
