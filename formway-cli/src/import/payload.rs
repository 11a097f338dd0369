//! Per-row request payload assembly
//!
//! Builds one `CreateElementRequest` per parent row: every mapped field
//! with a present raw value becomes a form-field payload, and child rows
//! become an item-list section when detail import is configured. Absent
//! values are omitted entirely, never sent as null.

use crate::api::models::{
    CreateElementRequest, FieldPayload, FormLayout, GuidRef, ItemCell, ItemList, ItemRow,
};

use super::classify::classify;
use super::coerce::coerce;
use super::mapping::{DetailColumnMapping, FieldMapping};
use super::progress::ProgressObserver;
use super::row::{ImportInput, Row};

/// How often the field loop re-polls cancellation
const CANCEL_POLL_STRIDE: usize = 16;

/// Identifiers of the workflow every created element belongs to
#[derive(Debug, Clone)]
pub struct ImportTarget {
    pub workflow: String,
    pub form_type: String,
    pub business_entity: Option<String>,
    pub item_list: Option<ItemListTarget>,
}

/// The item list child rows are appended to
#[derive(Debug, Clone)]
pub struct ItemListTarget {
    pub guid: String,
    pub name: String,
}

/// Stateless request builder for one import target
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    target: ImportTarget,
}

impl PayloadBuilder {
    pub fn new(target: ImportTarget) -> Self {
        Self { target }
    }

    /// Assemble the creation request for one row.
    ///
    /// Returns None only when cancellation was observed while walking the
    /// field list, so a long mapping set can be abandoned promptly.
    pub fn build_request(
        &self,
        row: &Row,
        input: &ImportInput,
        observer: &dyn ProgressObserver,
    ) -> Option<CreateElementRequest> {
        let form_fields = self.build_form_fields(row, &input.mappings, observer)?;
        let item_lists = self.build_item_lists(row, input);

        Some(CreateElementRequest {
            workflow: GuidRef::new(&self.target.workflow),
            form_type: GuidRef::new(&self.target.form_type),
            form_fields,
            business_entity: self.target.business_entity.as_deref().map(GuidRef::new),
            item_lists,
        })
    }

    fn build_form_fields(
        &self,
        row: &Row,
        mappings: &[FieldMapping],
        observer: &dyn ProgressObserver,
    ) -> Option<Vec<FieldPayload>> {
        let mut fields = Vec::with_capacity(mappings.len());

        for (index, mapping) in mappings.iter().enumerate() {
            if index > 0 && index % CANCEL_POLL_STRIDE == 0 && observer.is_cancelled() {
                return None;
            }

            let Some(raw) = row.fields.get(&mapping.source_column) else {
                continue;
            };
            if raw.is_blank() {
                continue;
            }

            let kind = classify(
                &mapping.column_type_hint,
                &mapping.database_name,
                mapping.flags.choice,
            );
            let coerced = coerce(raw, kind);

            fields.push(FieldPayload {
                guid: mapping.field_guid.clone(),
                wire_type: kind.wire_type().to_string(),
                svalue: coerced.display,
                name: mapping.database_name.clone(),
                form_layout: FormLayout {
                    editability: mapping.flags.editability(),
                    requiredness: mapping.flags.requiredness(),
                },
                value: coerced.value,
            });
        }

        Some(fields)
    }

    /// Item lists are emitted whenever detail import is configured, with an
    /// empty row set when the parent has no children.
    fn build_item_lists(&self, row: &Row, input: &ImportInput) -> Option<Vec<ItemList>> {
        let target = self.target.item_list.as_ref()?;
        if input.detail_mappings.is_empty() {
            return None;
        }

        let rows = input
            .detail_rows
            .get(&row.row_id)
            .map(|children| {
                children
                    .iter()
                    .map(|child| ItemRow {
                        cells: build_cells(child, &input.detail_mappings),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(vec![ItemList {
            guid: target.guid.clone(),
            name: target.name.clone(),
            mode: "Incremental".to_string(),
            rows,
        }])
    }
}

fn build_cells(row: &Row, mappings: &[DetailColumnMapping]) -> Vec<ItemCell> {
    let mut cells = Vec::with_capacity(mappings.len());
    for mapping in mappings {
        let Some(raw) = row.fields.get(&mapping.source_column) else {
            continue;
        };
        if raw.is_blank() {
            continue;
        }

        let kind = classify(
            &mapping.column_type_hint,
            &mapping.database_name,
            mapping.flags.choice,
        );
        let coerced = coerce(raw, kind);

        cells.push(ItemCell {
            guid: mapping.column_guid.clone(),
            svalue: coerced.display,
            value: coerced.value,
        });
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::mapping::MappingFlags;
    use crate::import::progress::SilentProgress;
    use crate::import::row::CellValue;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn field_mapping(column: &str, guid: &str, db_name: &str) -> FieldMapping {
        FieldMapping {
            source_column: column.to_string(),
            friendly_name: column.to_string(),
            database_name: db_name.to_string(),
            field_guid: guid.to_string(),
            column_type_hint: String::new(),
            flags: MappingFlags::default(),
        }
    }

    fn builder() -> PayloadBuilder {
        PayloadBuilder::new(ImportTarget {
            workflow: "wf-1".to_string(),
            form_type: "ft-1".to_string(),
            business_entity: None,
            item_list: None,
        })
    }

    fn input_with(mappings: Vec<FieldMapping>, rows: Vec<Row>) -> ImportInput {
        ImportInput {
            rows,
            mappings,
            ..ImportInput::default()
        }
    }

    #[test]
    fn test_absent_and_blank_values_are_omitted() {
        let mappings = vec![
            field_mapping("Name", "g-1", "WFD_Text1"),
            field_mapping("Count", "g-2", "WFD_AttInt1"),
            field_mapping("Notes", "g-3", "WFD_Text2"),
        ];
        let row = Row::new("row-1")
            .with_field("Name", CellValue::Text("Contoso".to_string()))
            .with_field("Notes", CellValue::Text("  ".to_string()));
        let input = input_with(mappings, vec![row.clone()]);

        let request = builder()
            .build_request(&row, &input, &SilentProgress)
            .unwrap();

        assert_eq!(request.form_fields.len(), 1);
        assert_eq!(request.form_fields[0].guid, "g-1");
        assert_eq!(request.form_fields[0].value, json!("Contoso"));
        assert!(request.item_lists.is_none());
        assert!(request.business_entity.is_none());
    }

    #[test]
    fn test_classification_flows_into_payload() {
        let mut choice = field_mapping("Vendor", "g-9", "WFD_Text9");
        choice.flags.choice = true;
        let mappings = vec![
            field_mapping("Count", "g-2", "WFD_AttInt1"),
            field_mapping("Active", "g-3", "WFD_AttBool1"),
            choice,
        ];
        let row = Row::new("row-1")
            .with_field("Count", CellValue::Text("12".to_string()))
            .with_field("Active", CellValue::Text("yes".to_string()))
            .with_field("Vendor", CellValue::Text("19#Acme".to_string()));
        let input = input_with(mappings, vec![row.clone()]);

        let request = builder()
            .build_request(&row, &input, &SilentProgress)
            .unwrap();

        let count = &request.form_fields[0];
        assert_eq!(count.wire_type, "integer");
        assert_eq!(count.value, json!(12));
        assert_eq!(count.svalue, "12");

        let active = &request.form_fields[1];
        assert_eq!(active.wire_type, "boolean");
        assert_eq!(active.value, json!(true));
        assert_eq!(active.svalue, "");

        let vendor = &request.form_fields[2];
        assert_eq!(vendor.wire_type, "choice");
        assert_eq!(vendor.value, json!([{ "id": "19", "name": "Acme" }]));
    }

    #[test]
    fn test_item_list_built_from_grouped_children() {
        let target = ImportTarget {
            workflow: "wf-1".to_string(),
            form_type: "ft-1".to_string(),
            business_entity: Some("be-1".to_string()),
            item_list: Some(ItemListTarget {
                guid: "il-1".to_string(),
                name: "Lines".to_string(),
            }),
        };
        let builder = PayloadBuilder::new(target);

        let detail_mapping = DetailColumnMapping {
            source_column: "Amount".to_string(),
            friendly_name: "Amount".to_string(),
            database_name: "DET_Value1".to_string(),
            column_guid: "dc-1".to_string(),
            column_type_hint: String::new(),
            flags: MappingFlags::default(),
        };

        let parent = Row::new("P-1").with_field("Name", CellValue::Text("x".to_string()));
        let mut input = input_with(vec![field_mapping("Name", "g-1", "WFD_Text1")], vec![parent.clone()]);
        input.detail_mappings = vec![detail_mapping];
        input.detail_rows.insert(
            "P-1".to_string(),
            vec![
                Row::new("P-1").with_field("Amount", CellValue::Number(10.5)),
                Row::new("P-1").with_field("Amount", CellValue::Number(2.0)),
            ],
        );

        let request = builder
            .build_request(&parent, &input, &SilentProgress)
            .unwrap();

        assert_eq!(request.business_entity, Some(GuidRef::new("be-1")));
        let lists = request.item_lists.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].mode, "Incremental");
        assert_eq!(lists[0].rows.len(), 2);
        assert_eq!(lists[0].rows[0].cells[0].guid, "dc-1");
        assert_eq!(lists[0].rows[0].cells[0].value, json!(10.5));

        // Parent without children still gets the (empty) list section
        let orphan = Row::new("P-2").with_field("Name", CellValue::Text("y".to_string()));
        let request = builder
            .build_request(&orphan, &input, &SilentProgress)
            .unwrap();
        assert_eq!(request.item_lists.unwrap()[0].rows.len(), 0);
    }

    #[test]
    fn test_cancellation_mid_field_list_abandons_the_row() {
        struct CancelAfter {
            polls: AtomicUsize,
        }
        impl ProgressObserver for CancelAfter {
            fn on_progress(
                &self,
                _: usize,
                _: usize,
                _: &str,
                _: crate::import::progress::RowOutcome,
                _: &ImportTotals,
            ) {
            }
            fn is_cancelled(&self) -> bool {
                self.polls.fetch_add(1, Ordering::SeqCst) >= 1
            }
        }
        use crate::import::progress::ImportTotals;

        let mappings: Vec<FieldMapping> = (0..64)
            .map(|i| field_mapping(&format!("Col{}", i), &format!("g-{}", i), "WFD_Text1"))
            .collect();
        let mut row = Row::new("row-1");
        for i in 0..64 {
            row = row.with_field(format!("Col{}", i), CellValue::Text("v".to_string()));
        }
        let input = input_with(mappings, vec![row.clone()]);

        let observer = CancelAfter {
            polls: AtomicUsize::new(1),
        };
        assert!(builder().build_request(&row, &input, &observer).is_none());
    }
}
