// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use clap::Parser;
use lumacue::error::ExitCode;
use lumacue::settings::Settings;
use tracing::error;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt::init();

    let settings = Settings::parse();

    match lumacue::run(settings).await {
        Ok(()) => std::process::ExitCode::from(ExitCode::Success as u8),
        Err(code) => {
            error!(exit_code = code as i32, "lumacue exiting with error");
            std::process::ExitCode::from(code as u8)
        }
    }
}
