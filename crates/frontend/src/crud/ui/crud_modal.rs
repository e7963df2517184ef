use contracts::crud::{ColumnInfo, Record};
use leptos::prelude::*;
use thaw::*;

use crate::crud::form::{build_record, form_fields};
use crate::shared::modal::Modal;

/// Add/edit form for one record.
///
/// Editing when `initial` is set; the grid decides what to do with the result.
#[component]
pub fn CrudModal(
    columns: Vec<ColumnInfo>,
    initial: Option<Record>,
    on_close: Callback<()>,
    on_save: Callback<Record>,
) -> impl IntoView {
    let title = if initial.is_some() {
        "Update record".to_string()
    } else {
        "Add record".to_string()
    };

    let fields: Vec<_> = form_fields(&columns, initial.as_ref())
        .into_iter()
        .map(|field| {
            let text = RwSignal::new(field.initial_text.clone());
            (field, text)
        })
        .collect();
    let fields = StoredValue::new(fields);

    let handle_save = move |_: leptos::ev::MouseEvent| {
        let record = fields.with_value(|fields| {
            build_record(fields.iter().map(|(field, text)| (field, text.get_untracked())))
        });
        on_save.run(record);
    };

    view! {
        <Modal
            title=title
            on_close=on_close
            action_buttons=move || {
                view! {
                    <Button appearance=ButtonAppearance::Primary on_click=handle_save>
                        "Save"
                    </Button>
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_: leptos::ev::MouseEvent| on_close.run(())>
                        "Cancel"
                    </Button>
                }
            }
        >
            {fields
                .get_value()
                .into_iter()
                .map(|(field, text)| {
                    let label = field.label();
                    let read_only = field.read_only;
                    view! {
                        <div class="form__group">
                            <Label>{label}</Label>
                            <Input value=text disabled=Signal::derive(move || read_only) />
                        </div>
                    }
                })
                .collect_view()}
        </Modal>
    }
}
