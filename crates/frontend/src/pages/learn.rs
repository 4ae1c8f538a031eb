//! Achievements, challenges and curricula.

use core_types::{ContentItem, ContentKind};
use gloo_net::http::Request;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::Route;
use crate::components::Loading;

fn kind_query(kind: Option<ContentKind>) -> &'static str {
    match kind {
        Some(ContentKind::Achievement) => "?kind=achievement",
        Some(ContentKind::Challenge) => "?kind=challenge",
        Some(ContentKind::Curriculum) => "?kind=curriculum",
        None => "",
    }
}

#[function_component(LearnPage)]
pub fn learn_page() -> Html {
    let items = use_state(Vec::<ContentItem>::new);
    let loading = use_state(|| true);
    let kind_filter = use_state(|| None::<ContentKind>);

    {
        let items = items.clone();
        let loading = loading.clone();
        let kind = *kind_filter;

        use_effect_with(kind, move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                let url = format!("/api/content{}", kind_query(kind));
                match Request::get(&url).send().await {
                    Ok(resp) => {
                        if let Ok(data) = resp.json::<Vec<ContentItem>>().await {
                            items.set(data);
                        }
                    }
                    Err(e) => {
                        web_sys::console::error_1(
                            &format!("Failed to fetch content: {}", e).into(),
                        );
                    }
                }
                loading.set(false);
            });
        });
    }

    let on_kind_change = {
        let kind_filter = kind_filter.clone();
        let loading = loading.clone();
        Callback::from(move |e: Event| {
            let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
            loading.set(true);
            kind_filter.set(select.value().parse::<ContentKind>().ok());
        })
    };

    html! {
        <div>
            <h1>{"Learn"}</h1>

            <div class="toolbar">
                <select class="filter-select" onchange={on_kind_change}>
                    <option value="">{"Everything"}</option>
                    <option value="challenge">{"Challenges"}</option>
                    <option value="curriculum">{"Curricula"}</option>
                    <option value="achievement">{"Achievements"}</option>
                </select>
            </div>

            if *loading {
                <Loading />
            } else {
                <div class="item-list">
                    { for items.iter().map(|item| html! {
                        <div class="card item-row">
                            <div>
                                <div class="card-title">{ &item.title }</div>
                                <div class="text-secondary">{ &item.description }</div>
                            </div>
                            if item.starter.is_some() {
                                <Link<Route>
                                    to={Route::Challenge { id: item.id.clone() }}
                                    classes="btn btn-primary"
                                >
                                    {"Try it"}
                                </Link<Route>>
                            } else {
                                <span class="text-secondary">{ &item.track }</span>
                            }
                        </div>
                    })}
                </div>
            }
        </div>
    }
}
