mod app;

use std::process::ExitCode;

fn main() -> ExitCode {
    let app = app::build_app();
    app::run(app)
}
