use crate::components::TreeList;
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <main class="mx-auto max-w-xl px-4 py-8">
                <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                    <Route path=path!("") view=TreeList />
                </Routes>
            </main>
        </Router>
    }
}
