#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

mod bindings;
#[cfg(not(target_arch = "wasm32"))]
mod cli;
#[cfg(not(target_arch = "wasm32"))]
mod run;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let cli = cli::parse();
    run::run(cli)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    web::start();
}
