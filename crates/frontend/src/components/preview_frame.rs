//! Sandboxed iframe showing one preview session.

use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct PreviewFrameProps {
    /// Session URL; nothing is shown until the first run
    pub src: Option<AttrValue>,
    /// Value of the iframe `sandbox` attribute
    pub sandbox: AttrValue,
}

/// The frame is keyed by its URL so every run gets a fresh browsing
/// context instead of navigating the old one.
#[function_component(PreviewFrame)]
pub fn preview_frame(props: &PreviewFrameProps) -> Html {
    match &props.src {
        Some(src) => html! {
            <iframe
                key={src.to_string()}
                class="preview-frame"
                title="Preview"
                sandbox={props.sandbox.clone()}
                referrerpolicy="no-referrer"
                src={src.clone()}
            />
        },
        None => html! {
            <div class="preview-frame card">
                <p class="text-secondary">{"Press Run to see your page."}</p>
            </div>
        },
    }
}
