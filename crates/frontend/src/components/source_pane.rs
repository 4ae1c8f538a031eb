//! Editable text area for one source buffer.

use core_types::SourceKind;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct SourcePaneProps {
    pub kind: SourceKind,
    pub text: AttrValue,
    pub on_change: Callback<(SourceKind, String)>,
}

#[function_component(SourcePane)]
pub fn source_pane(props: &SourcePaneProps) -> Html {
    let oninput = {
        let kind = props.kind;
        let on_change = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            let area: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
            on_change.emit((kind, area.value()));
        })
    };

    html! {
        <div class="source-pane">
            <label>{ format!("{} ({})", props.kind.label(), props.kind.file_name()) }</label>
            <textarea spellcheck="false" value={props.text.clone()} {oninput} />
        </div>
    }
}
