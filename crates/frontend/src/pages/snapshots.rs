//! Saved projects list.

use gloo_net::http::Request;
use web_types::SnapshotSummary;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::Route;
use crate::components::Loading;

#[function_component(SnapshotsPage)]
pub fn snapshots_page() -> Html {
    let snapshots = use_state(Vec::<SnapshotSummary>::new);
    let loading = use_state(|| true);

    {
        let snapshots = snapshots.clone();
        let loading = loading.clone();

        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match Request::get("/api/snapshots").send().await {
                    Ok(resp) => {
                        if let Ok(data) = resp.json::<Vec<SnapshotSummary>>().await {
                            snapshots.set(data);
                        }
                    }
                    Err(e) => {
                        web_sys::console::error_1(
                            &format!("Failed to fetch snapshots: {}", e).into(),
                        );
                    }
                }
                loading.set(false);
            });
        });
    }

    html! {
        <div>
            <h1>{"Saved Projects"}</h1>

            if *loading {
                <Loading />
            } else if snapshots.is_empty() {
                <div class="card">
                    <p>{"Nothing saved yet. Use Save in the editor."}</p>
                </div>
            } else {
                <div class="item-list">
                    { for snapshots.iter().map(|snapshot| html! {
                        <div class="card item-row">
                            <div>
                                <div class="card-title">{ &snapshot.title }</div>
                                <div class="text-secondary">
                                    { snapshot.created_at.format("%Y-%m-%d %H:%M").to_string() }
                                </div>
                            </div>
                            <Link<Route>
                                to={Route::Snapshot { key: snapshot.key.clone() }}
                                classes="btn btn-secondary"
                            >
                                {"Open"}
                            </Link<Route>>
                        </div>
                    })}
                </div>
            }
        </div>
    }
}
