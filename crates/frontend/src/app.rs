//! Main application component with routing.

use yew::prelude::*;
use yew_router::prelude::*;

use crate::pages::{EditorPage, EditorSource, LearnPage, SnapshotsPage};

/// Application routes.
#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Editor,
    #[at("/snapshots")]
    Snapshots,
    #[at("/snapshots/:key")]
    Snapshot { key: String },
    #[at("/learn")]
    Learn,
    #[at("/learn/:id")]
    Challenge { id: String },
    #[not_found]
    #[at("/404")]
    NotFound,
}

/// Route switch function.
fn switch(routes: Route) -> Html {
    match routes {
        Route::Editor => html! { <EditorPage source={EditorSource::Defaults} /> },
        Route::Snapshots => html! { <SnapshotsPage /> },
        Route::Snapshot { key } => html! { <EditorPage source={EditorSource::Snapshot(key)} /> },
        Route::Learn => html! { <LearnPage /> },
        Route::Challenge { id } => html! { <EditorPage source={EditorSource::Challenge(id)} /> },
        Route::NotFound => html! {
            <div class="card">
                <h1>{"404 - Page Not Found"}</h1>
                <p>{"The page you're looking for doesn't exist."}</p>
            </div>
        },
    }
}

/// Main application component.
#[function_component(App)]
pub fn app() -> Html {
    html! {
        <BrowserRouter>
            <div class="app-container">
                <Sidebar />
                <main class="main-content">
                    <Switch<Route> render={switch} />
                </main>
            </div>
        </BrowserRouter>
    }
}

/// Sidebar navigation component.
#[function_component(Sidebar)]
fn sidebar() -> Html {
    html! {
        <aside class="sidebar">
            <Link<Route> to={Route::Editor} classes="nav-brand">
                {"Hello World"}
            </Link<Route>>
            <nav>
                <ul class="nav-links">
                    <li>
                        <Link<Route> to={Route::Editor}>
                            {"Editor"}
                        </Link<Route>>
                    </li>
                    <li>
                        <Link<Route> to={Route::Snapshots}>
                            {"Saved Projects"}
                        </Link<Route>>
                    </li>
                    <li>
                        <Link<Route> to={Route::Learn}>
                            {"Learn"}
                        </Link<Route>>
                    </li>
                </ul>
            </nav>
        </aside>
    }
}
