mod app;
mod collision;
mod config;
mod geometry;
mod input;
mod model;
mod render;
mod session;
mod storage;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
