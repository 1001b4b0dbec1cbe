use std::process::ExitCode;

use postload::error::AppResult;

fn main() -> AppResult<ExitCode> {
    postload::entry::run()
}
