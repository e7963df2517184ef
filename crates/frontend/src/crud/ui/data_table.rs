use contracts::crud::{ColumnInfo, ConnectionDetails, Record};
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

use super::crud_modal::CrudModal;
use crate::crud::api::{GlooTransport, WindowConfirm};
use crate::crud::dispatcher::{CrudTarget, MutationDispatcher};
use crate::crud::grid::{cell_text, grid_layout};
use crate::shared::api_utils::api_base;

/// Generic grid over the rows of one table with Add/Update/Delete.
///
/// Columns come from the keys of the first record; with no records nothing
/// is rendered. `columns` is only handed to the editing modal. After every
/// successful mutation `on_refresh` asks the parent to reload `data`.
#[component]
pub fn DataTable(
    #[prop(into)] data: Signal<Vec<Record>>,
    #[prop(into)] columns: Signal<Vec<ColumnInfo>>,
    #[prop(into)] primary_key: Signal<Vec<String>>,
    #[prop(into)] table_name: Signal<String>,
    #[prop(into)] connection: Signal<ConnectionDetails>,
    on_refresh: Callback<()>,
) -> impl IntoView {
    let is_modal_open = RwSignal::new(false);
    let selected_row: RwSignal<Option<Record>> = RwSignal::new(None);

    let target = move || CrudTarget {
        table_name: table_name.get_untracked(),
        primary_key: primary_key.get_untracked(),
        connection: connection.get_untracked(),
    };
    let dispatcher = move || {
        MutationDispatcher::new(
            GlooTransport,
            WindowConfirm,
            move || on_refresh.run(()),
            api_base(),
        )
    };

    let handle_save = move |record: Record| {
        let target = target();
        let selected = selected_row.get_untracked();
        spawn_local(async move {
            if dispatcher()
                .save(&target, selected.as_ref(), record)
                .await
                .is_ok()
            {
                is_modal_open.set(false);
                selected_row.set(None);
            }
        });
    };

    let handle_delete = move |row: Record| {
        let target = target();
        spawn_local(async move {
            // Outcome and errors are already logged by the dispatcher
            let _ = dispatcher().delete(&target, &row).await;
        });
    };

    let open_for_add = move |_: leptos::ev::MouseEvent| {
        selected_row.set(None);
        is_modal_open.set(true);
    };

    let close_modal = Callback::new(move |_: ()| {
        is_modal_open.set(false);
        selected_row.set(None);
    });

    move || {
        let records = data.get();
        let Some(layout) = grid_layout(&records) else {
            return view! { <></> }.into_any();
        };
        let headers = layout.headers;

        let header_cells = headers
            .iter()
            .map(|header| {
                let header = header.clone();
                view! { <TableHeaderCell>{header}</TableHeaderCell> }
            })
            .collect_view();

        let body_rows = records
            .into_iter()
            .map(|row| {
                let cells = headers
                    .iter()
                    .map(|header| {
                        let text = cell_text(row.get(header));
                        view! {
                            <TableCell>
                                <TableCellLayout truncate=true>{text}</TableCellLayout>
                            </TableCell>
                        }
                    })
                    .collect_view();
                let row_for_edit = row.clone();
                let row_for_delete = row;
                view! {
                    <TableRow>
                        {cells}
                        <TableCell>
                            <div class="crud-grid__actions">
                                <Button
                                    appearance=ButtonAppearance::Primary
                                    on_click=move |_: leptos::ev::MouseEvent| {
                                        selected_row.set(Some(row_for_edit.clone()));
                                        is_modal_open.set(true);
                                    }
                                >
                                    "Update"
                                </Button>
                                <Button
                                    appearance=ButtonAppearance::Secondary
                                    on_click=move |_: leptos::ev::MouseEvent| {
                                        handle_delete(row_for_delete.clone())
                                    }
                                >
                                    "Delete"
                                </Button>
                            </div>
                        </TableCell>
                    </TableRow>
                }
            })
            .collect_view();

        view! {
            <div class="crud-grid">
                <div class="crud-grid__toolbar">
                    <Button appearance=ButtonAppearance::Primary on_click=open_for_add>
                        "Add"
                    </Button>
                </div>
                <div class="table-wrapper">
                    <Table attr:style="width: 100%;">
                        <TableHeader>
                            <TableRow>
                                {header_cells}
                                <TableHeaderCell>"Actions"</TableHeaderCell>
                            </TableRow>
                        </TableHeader>
                        <TableBody>{body_rows}</TableBody>
                    </Table>
                </div>
                {move || {
                    is_modal_open
                        .get()
                        .then(|| {
                            view! {
                                <CrudModal
                                    columns=columns.get_untracked()
                                    initial=selected_row.get_untracked()
                                    on_close=close_modal
                                    on_save=Callback::new(handle_save)
                                />
                            }
                        })
                }}
            </div>
        }
        .into_any()
    }
}
