//! Hello World playground - Yew WASM frontend
//!
//! Three source panes, a sandboxed live preview, and saved projects.

mod api;
mod app;
mod components;
mod pages;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point.
#[wasm_bindgen(start)]
pub fn main() {
    yew::Renderer::<App>::new().render();
}
