use crate::models::transaction::SHEET_HEADERS;
use google_sheets4::FieldMask;
use google_sheets4::api::{
    CellData, CellFormat, DeleteDimensionRequest, DimensionRange, GridProperties, GridRange,
    RepeatCellRequest, Request, SheetProperties, TextFormat, UpdateSheetPropertiesRequest,
};

/// Grid id of the first tab, which holds the ledger.
pub(super) const LEDGER_SHEET_ID: i32 = 0;

/// Remove one physical row (1-based); the rows below move up.
pub(super) fn delete_row_request(sheet_id: i32, row: u32) -> Request {
    let row = row as i32;
    Request {
        delete_dimension: Some(DeleteDimensionRequest {
            range: Some(DimensionRange {
                sheet_id: Some(sheet_id),
                dimension: Some("ROWS".to_string()),
                // Zero-based and end-exclusive
                start_index: Some(row - 1),
                end_index: Some(row),
            }),
        }),
        ..Default::default()
    }
}

/// Bold the header labels and keep them frozen above the data.
pub(super) fn header_format_requests(sheet_id: i32) -> Vec<Request> {
    let header_cells = GridRange {
        sheet_id: Some(sheet_id),
        start_row_index: Some(0),
        end_row_index: Some(1),
        start_column_index: Some(0),
        end_column_index: Some(SHEET_HEADERS.len() as i32),
    };

    let bold = Request {
        repeat_cell: Some(RepeatCellRequest {
            range: Some(header_cells),
            cell: Some(CellData {
                user_entered_format: Some(CellFormat {
                    text_format: Some(TextFormat {
                        bold: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["userEnteredFormat.textFormat.bold"])),
        }),
        ..Default::default()
    };

    let freeze = Request {
        update_sheet_properties: Some(UpdateSheetPropertiesRequest {
            properties: Some(SheetProperties {
                sheet_id: Some(sheet_id),
                grid_properties: Some(GridProperties {
                    frozen_row_count: Some(1),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["gridProperties.frozenRowCount"])),
        }),
        ..Default::default()
    };

    vec![bold, freeze]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_row_request() {
        let req = delete_row_request(LEDGER_SHEET_ID, 5);
        let range = req.delete_dimension.unwrap().range.unwrap();

        assert_eq!(range.sheet_id, Some(0));
        assert_eq!(range.dimension.as_deref(), Some("ROWS"));
        assert_eq!(range.start_index, Some(4));
        assert_eq!(range.end_index, Some(5));
    }

    #[test]
    fn test_delete_row_request_wire_format() {
        let req = delete_row_request(LEDGER_SHEET_ID, 2);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["deleteDimension"]["range"]["startIndex"], 1);
        assert_eq!(json["deleteDimension"]["range"]["endIndex"], 2);
        assert_eq!(json["deleteDimension"]["range"]["dimension"], "ROWS");
    }

    #[test]
    fn test_header_format_requests() {
        let reqs = header_format_requests(123);
        assert_eq!(reqs.len(), 2, "should have 2 requests, got {:?}", reqs);

        let repeat_cell = reqs[0].repeat_cell.as_ref().unwrap();
        let range = repeat_cell.range.as_ref().unwrap();
        assert_eq!(range.sheet_id, Some(123));
        assert_eq!(range.end_row_index, Some(1));
        assert_eq!(range.end_column_index, Some(6));
        assert_eq!(
            repeat_cell
                .cell
                .as_ref()
                .and_then(|c| c.user_entered_format.as_ref())
                .and_then(|f| f.text_format.as_ref())
                .and_then(|t| t.bold),
            Some(true)
        );

        let props = reqs[1]
            .update_sheet_properties
            .as_ref()
            .unwrap()
            .properties
            .as_ref()
            .unwrap();
        assert_eq!(props.sheet_id, Some(123));
        assert_eq!(
            props.grid_properties.as_ref().unwrap().frozen_row_count,
            Some(1)
        );
    }
}
