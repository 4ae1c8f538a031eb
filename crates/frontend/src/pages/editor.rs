//! The live-preview editor page.

use core_types::{ContentItem, Snapshot, SourceBuffers, SourceKind};
use gloo_timers::callback::Timeout;
use yew::prelude::*;

use crate::api::{self, get_json, post_json};
use crate::components::{Loading, PreviewFrame, SourcePane};
use uuid::Uuid;
use web_types::{DefaultsResponse, ExportRequest, RunRequest, SaveSnapshotRequest};

/// How long a status message stays visible, in milliseconds.
const STATUS_TIMEOUT_MS: u32 = 3_000;

/// What the editor starts with when the page opens.
#[derive(Clone, PartialEq)]
pub enum EditorSource {
    Defaults,
    Snapshot(String),
    Challenge(String),
}

#[derive(Properties, PartialEq)]
pub struct EditorPageProps {
    pub source: EditorSource,
}

/// Load the defaults plus whatever the route asks to open.
async fn load_start(
    source: &EditorSource,
) -> Result<(DefaultsResponse, SourceBuffers, String), String> {
    let defaults = get_json::<DefaultsResponse>("/api/defaults").await?;

    let (buffers, title) = match source {
        EditorSource::Defaults => (defaults.buffers.clone(), defaults.title.clone()),
        EditorSource::Snapshot(key) => {
            let snapshot = get_json::<Snapshot>(&format!("/api/snapshots/{key}")).await?;
            (snapshot.record.to_buffers(), snapshot.record.title)
        }
        EditorSource::Challenge(id) => {
            let item = get_json::<ContentItem>(&format!("/api/content/{id}")).await?;
            let buffers = item.starter.unwrap_or_else(|| defaults.buffers.clone());
            (buffers, item.title)
        }
    };

    Ok((defaults, buffers, title))
}

#[function_component(EditorPage)]
pub fn editor_page(props: &EditorPageProps) -> Html {
    let defaults = use_state(|| None::<DefaultsResponse>);
    let buffers = use_state(SourceBuffers::default);
    let title = use_state(String::new);
    let editor = use_mut_ref(|| None::<Uuid>);
    let preview_url = use_state(|| None::<AttrValue>);
    let status = use_state(|| None::<String>);
    let status_timer = use_mut_ref(|| None::<Timeout>);

    let show_status = {
        let status = status.clone();
        let status_timer = status_timer.clone();
        Callback::from(move |message: String| {
            status.set(Some(message));
            let status = status.clone();
            // Replacing the handle cancels the previous timeout
            *status_timer.borrow_mut() =
                Some(Timeout::new(STATUS_TIMEOUT_MS, move || status.set(None)));
        })
    };

    {
        let defaults = defaults.clone();
        let buffers = buffers.clone();
        let title = title.clone();
        let preview_url = preview_url.clone();
        let show_status = show_status.clone();

        use_effect_with(props.source.clone(), move |source| {
            let source = source.clone();
            preview_url.set(None);
            wasm_bindgen_futures::spawn_local(async move {
                match load_start(&source).await {
                    Ok((loaded, start, start_title)) => {
                        buffers.set(start);
                        title.set(start_title);
                        defaults.set(Some(loaded));
                    }
                    Err(e) => {
                        api::log_error("Failed to open editor", &e);
                        show_status.emit(format!("Could not load: {e}"));
                    }
                }
            });
        });
    }

    let on_source_change = {
        let buffers = buffers.clone();
        Callback::from(move |(kind, text): (SourceKind, String)| {
            let mut next = (*buffers).clone();
            next.set(kind, text);
            buffers.set(next);
        })
    };

    let on_title_input = {
        let title = title.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            title.set(input.value());
        })
    };

    let on_run = {
        let editor = editor.clone();
        let buffers = buffers.clone();
        let title = title.clone();
        let preview_url = preview_url.clone();
        let show_status = show_status.clone();
        Callback::from(move |_: MouseEvent| {
            let request = RunRequest {
                buffers: (*buffers).clone(),
                title: Some((*title).clone()),
            };
            let editor = editor.clone();
            let preview_url = preview_url.clone();
            let show_status = show_status.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let current = *editor.borrow();
                match api::run(current, &request).await {
                    Ok((opened, resp)) => {
                        *editor.borrow_mut() = Some(opened);
                        preview_url.set(Some(resp.preview_url.into()));
                    }
                    Err(e) => {
                        api::log_error("Run failed", &e);
                        show_status.emit(format!("Run failed: {e}"));
                    }
                }
            });
        })
    };

    // Reset only touches the buffers; the preview keeps its last run
    let on_reset = {
        let defaults = defaults.clone();
        let buffers = buffers.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(defaults) = defaults.as_ref() {
                buffers.set(defaults.buffers.clone());
            }
        })
    };

    let on_save = {
        let buffers = buffers.clone();
        let title = title.clone();
        let show_status = show_status.clone();
        Callback::from(move |_: MouseEvent| {
            let request = SaveSnapshotRequest {
                buffers: (*buffers).clone(),
                title: (*title).clone(),
            };
            let show_status = show_status.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match post_json::<_, Snapshot>("/api/snapshots", &request).await {
                    Ok(snapshot) => show_status.emit(format!("Saved as {}", snapshot.key)),
                    Err(e) => {
                        api::log_error("Save failed", &e);
                        show_status.emit(format!("Save failed: {e}"));
                    }
                }
            });
        })
    };

    let on_download = {
        let buffers = buffers.clone();
        let title = title.clone();
        let show_status = show_status.clone();
        Callback::from(move |_: MouseEvent| {
            let request = ExportRequest {
                buffers: (*buffers).clone(),
                title: Some((*title).clone()),
            };
            let show_status = show_status.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = match api::export(&request).await {
                    Ok(download) => api::start_download(&download).map(|()| download.filename),
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(filename) => show_status.emit(format!("Downloaded {filename}")),
                    Err(e) => {
                        api::log_error("Download failed", &e);
                        show_status.emit(format!("Download failed: {e}"));
                    }
                }
            });
        })
    };

    let Some(loaded) = defaults.as_ref() else {
        return html! {
            <div>
                <Loading />
                if let Some(message) = status.as_ref() {
                    <p class="status text-secondary">{ message }</p>
                }
            </div>
        };
    };

    html! {
        <div>
            <div class="toolbar">
                <input
                    type="text"
                    class="title-input"
                    placeholder="Project title"
                    value={(*title).clone()}
                    oninput={on_title_input}
                />
                <button class="btn btn-primary" onclick={on_run}>{"Run"}</button>
                <button class="btn btn-secondary" onclick={on_reset}>{"Reset"}</button>
                <button class="btn btn-secondary" onclick={on_save}>{"Save"}</button>
                <button class="btn btn-secondary" onclick={on_download}>{"Download"}</button>
                if let Some(message) = status.as_ref() {
                    <span class="status text-secondary">{ message }</span>
                }
            </div>

            <div class="editor-grid">
                <div class="source-panes">
                    { for SourceKind::ALL.iter().map(|kind| html! {
                        <SourcePane
                            kind={*kind}
                            text={AttrValue::from(buffers.get(*kind).to_string())}
                            on_change={on_source_change.clone()}
                        />
                    })}
                </div>
                <PreviewFrame
                    src={(*preview_url).clone()}
                    sandbox={AttrValue::from(loaded.sandbox.clone())}
                />
            </div>
        </div>
    }
}
