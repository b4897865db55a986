pub mod cli;
pub mod http;

pub use cli::{print_sample_config, Cli, CliError, CliHandler, Commands};
pub use http::{
    check_json, check_page, create_router, download_clean_bag, health, index, ApiError, ApiServer, AppState,
    ErrorResponse, HealthResponse,
};
