use crate::components::tree_view::TreeView;
use crate::components::ui::{Alert, AlertDescription, Button, ButtonSize};
use crate::config::TreeConfig;
use crate::state::TreeListState;
use leptos::prelude::*;

/// A persisted, editable tree with its save button.
///
/// Each instance loads its own session from storage on mount.
#[component]
pub fn TreeList() -> impl IntoView {
    let state = TreeListState::new(TreeConfig::new());
    provide_context(state);

    let dirty = Memo::new(move |_| state.is_dirty());
    let error = move || state.last_error.get();

    view! {
        <div class="flex flex-col gap-2">
            <Show when=move || error().is_some() fallback=|| ().into_view()>
                <Alert class="border-destructive/50 text-destructive">
                    <AlertDescription>{move || error().unwrap_or_default()}</AlertDescription>
                </Alert>
            </Show>

            <TreeView />

            <Show when=move || dirty.get() fallback=|| ().into_view()>
                <div>
                    <Button size=ButtonSize::Sm on:click=move |_| state.save()>
                        "Save Changes"
                    </Button>
                </div>
            </Show>
        </div>
    }
}
