use contracts::crud::{ConnectionDetails, TableData};
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

use crate::crud::api;
use crate::crud::ui::DataTable;
use crate::shared::storage;

/// Whether a response for `requested` still belongs to the selected table.
/// A slower response for a previously selected table must not replace the grid.
fn is_current(selected: Option<&str>, requested: &str) -> bool {
    selected == Some(requested)
}

/// Admin page: pick a database and a table, then edit its rows in the grid
#[component]
pub fn App() -> impl IntoView {
    let database = RwSignal::new(
        storage::load_connection()
            .map(|c| c.database)
            .unwrap_or_default(),
    );
    let connection: RwSignal<ConnectionDetails> = RwSignal::new(ConnectionDetails::default());
    let tables: RwSignal<Vec<String>> = RwSignal::new(Vec::new());
    let selected_table: RwSignal<Option<String>> = RwSignal::new(None);
    let table_data: RwSignal<TableData> = RwSignal::new(TableData::default());
    let (error, set_error) = signal::<Option<String>>(None);
    let (loading, set_loading) = signal(false);

    let load_table = move |table: String| {
        set_loading.set(true);
        set_error.set(None);
        let details = connection.get_untracked();
        spawn_local(async move {
            let result = api::fetch_table(&details, &table).await;
            if !is_current(selected_table.get_untracked().as_deref(), &table) {
                log::debug!("Dropping stale response for '{}'", table);
                return;
            }
            match result {
                Ok(data) => {
                    log::info!("Loaded {} rows from '{}'", data.rows.len(), table);
                    table_data.set(data);
                }
                Err(e) => {
                    log::error!("Failed to load table '{}': {}", table, e);
                    set_error.set(Some(format!("Failed to load table '{}': {}", table, e)));
                }
            }
            set_loading.set(false);
        });
    };

    let connect = move || {
        let details = ConnectionDetails {
            database: database.get_untracked().trim().to_string(),
        };
        if details.database.is_empty() {
            return;
        }
        storage::save_connection(&details);
        connection.set(details.clone());
        selected_table.set(None);
        table_data.set(TableData::default());
        set_loading.set(true);
        set_error.set(None);
        spawn_local(async move {
            match api::fetch_tables(&details).await {
                Ok(names) => tables.set(names),
                Err(e) => {
                    log::error!("Failed to list tables: {}", e);
                    tables.set(Vec::new());
                    set_error.set(Some(format!("Failed to list tables: {}", e)));
                }
            }
            set_loading.set(false);
        });
    };

    let select_table = move |table: String| {
        selected_table.set(Some(table.clone()));
        table_data.set(TableData::default());
        load_table(table);
    };

    let refresh = Callback::new(move |_: ()| {
        if let Some(table) = selected_table.get_untracked() {
            load_table(table);
        }
    });

    // Reconnect to the remembered database on first render
    Effect::new(move |_| {
        if !database.get_untracked().is_empty() {
            connect();
        }
    });

    view! {
        <ConfigProvider>
        <div class="page">
            <div class="page__header">
                <div class="page__header-left">
                    <h1 class="page__title">"Tables"</h1>
                    <Badge>{move || tables.get().len().to_string()}</Badge>
                </div>
            </div>

            <div class="page__content">
                {move || error.get().map(|e| view! { <div class="alert alert--error">{e}</div> })}

                <div class="filter-panel">
                    <Flex gap=FlexGap::Small align=FlexAlign::End>
                        <div style="flex: 1; max-width: 420px;">
                            <Label>"Database"</Label>
                            <Input value=database placeholder="shop.db" />
                        </div>
                        <Button
                            appearance=ButtonAppearance::Primary
                            on_click=move |_: leptos::ev::MouseEvent| connect()
                            disabled=Signal::derive(move || loading.get())
                        >
                            "Connect"
                        </Button>
                    </Flex>
                </div>

                <div class="table-list">
                    <For
                        each=move || tables.get()
                        key=|name| name.clone()
                        children=move |name| {
                            let label = name.clone();
                            let is_selected = {
                                let name = name.clone();
                                move || selected_table.get().as_deref() == Some(name.as_str())
                            };
                            view! {
                                <Button
                                    appearance=Signal::derive(move || {
                                        if is_selected() {
                                            ButtonAppearance::Primary
                                        } else {
                                            ButtonAppearance::Secondary
                                        }
                                    })
                                    on_click=move |_: leptos::ev::MouseEvent| select_table(name.clone())
                                >
                                    {label}
                                </Button>
                            }
                        }
                    />
                </div>

                {move || {
                    let empty = selected_table.get().is_some()
                        && !loading.get()
                        && table_data.with(|d| d.rows.is_empty());
                    empty.then(|| view! { <div class="alert">"The table has no rows."</div> })
                }}

                <DataTable
                    data=Signal::derive(move || table_data.get().rows)
                    columns=Signal::derive(move || table_data.get().columns)
                    primary_key=Signal::derive(move || table_data.get().primary_key)
                    table_name=Signal::derive(move || table_data.get().table)
                    connection=connection
                    on_refresh=refresh
                />
            </div>
        </div>
        </ConfigProvider>
    }
}
