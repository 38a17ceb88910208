use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::coordinator::TreeEvent;
use crate::engine::{drop_target_for, visible_rows, DropPosition, DropTarget, VisibleRow};
use crate::state::TreeListState;
use icons::{ChevronDown, ChevronRight};
use leptos::html;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

const INDENT_PX: usize = 16;

fn pointer_position(ev: &web_sys::DragEvent) -> DropPosition {
    ev.current_target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(|el| el.get_bounding_client_rect())
        .map(|rect| DropPosition::from_offset(ev.client_y() as f64 - rect.top(), rect.height()))
        .unwrap_or(DropPosition::Inside)
}

/// Ids carried by the drag in progress.
///
/// The session remembers them from drag-start; the transfer payload covers
/// drags that started before a re-render dropped that state.
fn dragged_items(state: &TreeListState, ev: &web_sys::DragEvent) -> Vec<String> {
    let items = state
        .session
        .with_untracked(|s| s.dragging_items().to_vec());
    if !items.is_empty() {
        return items;
    }

    ev.data_transfer()
        .and_then(|dt| dt.get_data("text/plain").ok())
        .map(|raw| {
            raw.lines()
                .map(str::trim)
                .filter(|x| !x.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[component]
pub fn TreeView() -> impl IntoView {
    let state = expect_context::<TreeListState>();

    let rows = Memo::new(move |_| {
        let expanded = state.expanded.get();
        state
            .session
            .with(|s| visible_rows(s.items(), &expanded))
    });

    let (tree_id, tree_label) = state
        .config
        .with_value(|c| (c.tree_id.clone(), c.tree_label.clone()));
    let can_drag = state
        .session
        .with_untracked(|s| s.capabilities().can_drag_and_drop);

    view! {
        <div
            id=tree_id
            role="tree"
            aria-label=tree_label
            class="relative min-h-[30px] rounded-md border p-1"
            on:dragover=move |ev: web_sys::DragEvent| {
                if can_drag {
                    ev.prevent_default();
                }
            }
            on:drop=move |ev: web_sys::DragEvent| {
                // Rows stop propagation, so this is a drop on empty space.
                ev.prevent_default();
                let items = dragged_items(&state, &ev);
                if items.is_empty() {
                    return;
                }
                state.dispatch(TreeEvent::Drop {
                    items,
                    target: DropTarget::Root,
                });
            }
        >
            <Show when=move || rows.with(|r| r.is_empty()) fallback=|| ().into_view()>
                <div class="px-2 py-1 text-xs text-muted-foreground">"No items yet."</div>
            </Show>
            <For
                each=move || rows.get()
                key=|row| row.clone()
                children=move |row: VisibleRow| view! { <TreeRow row=row /> }
            />
        </div>
    }
}

#[component]
fn TreeRow(row: VisibleRow) -> impl IntoView {
    let state = expect_context::<TreeListState>();
    let caps = state.session.with_untracked(|s| *s.capabilities());

    let id = StoredValue::new(row.id.clone());
    let input_ref: NodeRef<html::Input> = NodeRef::new();

    let is_selected = move || {
        state
            .selected
            .with(|xs| id.with_value(|id| xs.iter().any(|x| x == id)))
    };
    let is_renaming = move || {
        state
            .renaming
            .with(|r| id.with_value(|id| r.as_deref() == Some(id.as_str())))
    };

    Effect::new(move |_| {
        if !is_renaming() {
            return;
        }
        if let Some(input) = input_ref.get() {
            let _ = input.focus();
            input.select();
        }
    });

    let row_class = move || {
        let hint = state.drop_hint.with(|h| {
            id.with_value(|id| {
                h.as_ref()
                    .filter(|(hovered, _)| hovered == id)
                    .map(|(_, pos)| *pos)
            })
        });

        let mut class = String::from("flex items-center gap-1 rounded-sm px-1 py-0.5 text-sm outline-none");
        if is_selected() {
            class.push_str(" bg-accent text-accent-foreground");
        }
        match hint {
            Some(DropPosition::Before) => class.push_str(" border-t-2 border-primary"),
            Some(DropPosition::After) => class.push_str(" border-b-2 border-primary"),
            Some(DropPosition::Inside) => class.push_str(" bg-primary/10 ring-1 ring-primary"),
            None => {}
        }
        class
    };

    let chevron = if row.has_children {
        let expanded = row.expanded;
        let toggle_title = if expanded { "Collapse" } else { "Expand" };
        view! {
            <Button
                variant=ButtonVariant::Ghost
                size=ButtonSize::Icon
                attr:title=toggle_title
                attr:aria-expanded=expanded.to_string()
                on:click=move |ev: web_sys::MouseEvent| {
                    ev.stop_propagation();
                    id.with_value(|id| state.toggle_expanded(id));
                }
            >
                {if expanded {
                    view! { <ChevronDown class="size-4" /> }.into_any()
                } else {
                    view! { <ChevronRight class="size-4" /> }.into_any()
                }}
            </Button>
        }
        .into_any()
    } else {
        view! { <span class="inline-block size-6" aria-hidden="true"></span> }.into_any()
    };

    let title = row.title.clone();
    let folder_hint = row.is_folder && !row.has_children;
    let level = (row.depth + 1).to_string();
    let indent = format!("padding-left: {}px", row.depth * INDENT_PX);
    let draggable = if caps.can_drag_and_drop { "true" } else { "false" };

    view! {
        <div
            role="treeitem"
            tabindex="0"
            attr:aria-level=level
            aria-selected=move || is_selected().to_string()
            class=row_class
            style=indent
            draggable=draggable
            on:click=move |ev: web_sys::MouseEvent| {
                id.with_value(|id| state.select(id, ev.ctrl_key() || ev.meta_key()));
            }
            on:dblclick=move |_| id.with_value(|id| state.start_rename(id))
            on:keydown=move |ev: web_sys::KeyboardEvent| {
                if ev.key() == "F2" && !is_renaming() {
                    ev.prevent_default();
                    id.with_value(|id| state.start_rename(id));
                }
            }
            on:dragstart=move |ev: web_sys::DragEvent| {
                let items = id.with_value(|id| state.drag_items_for(id));
                if let Some(dt) = ev.data_transfer() {
                    let _ = dt.set_data("text/plain", &items.join("\n"));
                    dt.set_effect_allowed("move");
                }
                state.dispatch(TreeEvent::DragStart(items));
            }
            on:dragover=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                ev.stop_propagation();
                if let Some(dt) = ev.data_transfer() {
                    dt.set_drop_effect("move");
                }
                let next = Some((id.get_value(), pointer_position(&ev)));
                if state.drop_hint.with_untracked(|h| *h != next) {
                    state.drop_hint.set(next);
                }
            }
            on:dragleave=move |_| {
                let here = state
                    .drop_hint
                    .with_untracked(|h| id.with_value(|id| h.as_ref().is_some_and(|(x, _)| x == id)));
                if here {
                    state.drop_hint.set(None);
                }
            }
            on:drop=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                ev.stop_propagation();

                let items = dragged_items(&state, &ev);
                if items.is_empty() {
                    state.drop_hint.set(None);
                    return;
                }

                let position = pointer_position(&ev);
                let target = state
                    .session
                    .with_untracked(|s| id.with_value(|id| drop_target_for(s.items(), id, position)));
                match target {
                    Some(target) => {
                        state.dispatch(TreeEvent::Drop { items, target });
                    }
                    None => state.drop_hint.set(None),
                }
            }
            on:dragend=move |_| {
                state.drop_hint.set(None);
                if state.session.with_untracked(|s| s.is_dragging()) {
                    state.dispatch(TreeEvent::DragEnd);
                }
            }
        >
            {chevron}
            <Show
                when=is_renaming
                fallback=move || {
                    let title = title.clone();
                    view! {
                        <span class="truncate select-none">{title}</span>
                        <Show when=move || folder_hint fallback=|| ().into_view()>
                            <span class="text-xs text-muted-foreground">"(empty)"</span>
                        </Show>
                    }
                }
            >
                <input
                    node_ref=input_ref
                    class="h-6 w-full rounded-sm border bg-transparent px-1 text-sm outline-none"
                    prop:value=move || state.rename_value.get()
                    on:input=move |ev| state.rename_value.set(event_target_value(&ev))
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        ev.stop_propagation();
                        match ev.key().as_str() {
                            "Enter" => {
                                ev.prevent_default();
                                state.commit_rename();
                            }
                            "Escape" => state.cancel_rename(),
                            _ => {}
                        }
                    }
                    on:blur=move |_| state.commit_rename()
                    on:click=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                />
            </Show>
        </div>
    }
}
