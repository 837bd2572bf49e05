//! The pharmacy maintenance catalog.
//!
//! Table and column names are crate constants so every cascade step and
//! reference-check site is spelled exactly once. The schema carries no
//! enforced foreign keys; ownership and reference bookkeeping is done by
//! the purge engine itself.

use crate::core::{Column, DataType};
use crate::storage::TableSchema;

// Shared key columns.
pub const ORDER_ID: &str = "order_id";
pub const HIST_TS: &str = "hist_ts";
pub const PATIENT_ID: &str = "patient_id";
pub const PRESCRIBER_ID: &str = "prescriber_id";
pub const GROUP_NO: &str = "group_no";
pub const PARENT_GROUP_NO: &str = "parent_group_no";
pub const SCHEDULE_ID: &str = "schedule_id";
pub const PAPERWORK_ID: &str = "paperwork_id";
pub const REPLEN_ID: &str = "replen_id";
pub const SHIPMENT_ID: &str = "shipment_id";
pub const MANIFEST_ID: &str = "manifest_id";
pub const PALLET_ID: &str = "pallet_id";
pub const LOAD_ID: &str = "load_id";
pub const IMAGE_ID: &str = "image_id";
pub const IMAGE_NO: &str = "image_no";
pub const ARCHIVED: &str = "archived";
pub const LOGGED_AT: &str = "logged_at";

// Root and live order tables.
pub const ORDER_HIST: &str = "order_hist";
pub const ORDER_LIVE: &str = "order_live";
pub const ORDER_QUEUE: &str = "order_queue";

// Owned dependents keyed by (order_id, hist_ts).
pub const ORDER_ATTR_HIST: &str = "order_attr_hist";
pub const ORDER_AUDIT_HIST: &str = "order_audit_hist";
pub const ORDER_ROUTE_HIST: &str = "order_route_hist";
pub const ORDER_DUR_HIST: &str = "order_dur_hist";
pub const ORDER_FLAG_HIST: &str = "order_flag_hist";
pub const ORDER_LOT_HIST: &str = "order_lot_hist";
pub const ORDER_LABEL_HIST: &str = "order_label_hist";
pub const ORDER_DOC_HIST: &str = "order_doc_hist";
pub const ORDER_TEXT_HIST: &str = "order_text_hist";
pub const ORDER_PLAN_HIST: &str = "order_plan_hist";
pub const ORDER_BAG_HIST: &str = "order_bag_hist";
pub const ORDER_ITEM_HIST: &str = "order_item_hist";
pub const ORDER_POUCH_HIST: &str = "order_pouch_hist";
pub const ORDER_LANG_HIST: &str = "order_lang_hist";

/// The simple owned-dependent tables deleted in cascade step 1.
pub const OWNED_DEPENDENT_TABLES: [&str; 14] = [
    ORDER_ATTR_HIST,
    ORDER_AUDIT_HIST,
    ORDER_ROUTE_HIST,
    ORDER_DUR_HIST,
    ORDER_FLAG_HIST,
    ORDER_LOT_HIST,
    ORDER_LABEL_HIST,
    ORDER_DOC_HIST,
    ORDER_TEXT_HIST,
    ORDER_PLAN_HIST,
    ORDER_BAG_HIST,
    ORDER_ITEM_HIST,
    ORDER_POUCH_HIST,
    ORDER_LANG_HIST,
];

// Images: current generation keyed by UUID, legacy generation by integer.
pub const ORDER_IMAGE_HIST: &str = "order_image_hist";
pub const ORDER_IMAGE_LEGACY: &str = "order_image_legacy";
pub const IMAGE: &str = "image";
pub const IMAGE_LEGACY: &str = "image_legacy";

// Dose-schedule tree.
pub const SCHEDULE_HIST: &str = "schedule_hist";
pub const SCHEDULE_DOSE: &str = "schedule_dose";
pub const SCHEDULE_DAY: &str = "schedule_day";

// Paperwork.
pub const ORDER_PAPERWORK_HIST: &str = "order_paperwork_hist";
pub const PAPERWORK_SET: &str = "paperwork_set";

// Canister replenishment.
pub const ORDER_REPLEN_HIST: &str = "order_replen_hist";
pub const REPLEN_HIST: &str = "replen_hist";
pub const REPLEN_LOT_HIST: &str = "replen_lot_hist";
pub const REPLEN_IMAGE: &str = "replen_image";

// Shipment graph.
pub const ORDER_SHIPMENT_HIST: &str = "order_shipment_hist";
pub const SHIPMENT_ROUTE: &str = "shipment_route";
pub const SHIPMENT_TRAY: &str = "shipment_tray";
pub const SHIPMENT_LABEL: &str = "shipment_label";
pub const SHIPMENT_SERVICE: &str = "shipment_service";
pub const SHIPMENT_TOTE: &str = "shipment_tote";
pub const SHIPMENT: &str = "shipment";
pub const MANIFEST: &str = "manifest";
pub const PALLET: &str = "pallet";
pub const LOAD: &str = "load";

/// Shipment-scoped tables cleared in one sweep once a batch's shipment ids
/// are known. Route and tray rows should already only exist for active
/// shipments; removing them here is a safety delete.
pub const SHIPMENT_DETAIL_TABLES: [&str; 5] = [
    SHIPMENT_ROUTE,
    SHIPMENT_TRAY,
    SHIPMENT_LABEL,
    SHIPMENT_SERVICE,
    SHIPMENT_TOTE,
];

// Shared people/containers.
pub const PATIENT: &str = "patient";
pub const PRESCRIBER: &str = "prescriber";
pub const RX_GROUP: &str = "rx_group";

// Tables keyed by order_id alone, cleaned only when no live or historical
// order row remains for the id.
pub const ORDER_COMMENT: &str = "order_comment";
pub const ORDER_PO: &str = "order_po";
pub const ORDER_PROBLEM: &str = "order_problem";
pub const ORDER_FOLLOWUP: &str = "order_followup";
pub const ORDER_STATUS_TRAIL: &str = "order_status_trail";

pub const ID_ONLY_TABLES: [&str; 5] = [
    ORDER_COMMENT,
    ORDER_PO,
    ORDER_PROBLEM,
    ORDER_FOLLOWUP,
    ORDER_STATUS_TRAIL,
];

// Secondary aging stream.
pub const AUDIT_REJECT: &str = "audit_reject";
pub const REJECT_ID: &str = "reject_id";

fn hist_key() -> Vec<Column> {
    vec![
        Column::new(ORDER_ID, DataType::Integer).not_null(),
        Column::new(HIST_TS, DataType::Timestamp).not_null(),
    ]
}

fn owned_dependent(name: &str) -> TableSchema {
    let mut columns = hist_key();
    columns.push(Column::new("detail", DataType::Text));
    TableSchema::new(name, columns)
}

fn hist_assoc(name: &str, ref_column: &str, ref_type: DataType) -> TableSchema {
    let mut columns = hist_key();
    columns.push(Column::new(ref_column, ref_type).not_null());
    TableSchema::new(name, columns)
}

fn id_only(name: &str) -> TableSchema {
    TableSchema::new(
        name,
        vec![
            Column::new(ORDER_ID, DataType::Integer).not_null(),
            Column::new("detail", DataType::Text),
        ],
    )
}

/// Every table the maintenance engine touches, ready to bootstrap into an
/// [`crate::storage::InMemoryStorage`].
pub fn maintenance_catalog() -> Vec<TableSchema> {
    let mut catalog = Vec::new();

    // Root history: composite key (order_id, hist_ts).
    catalog.push(TableSchema::new(
        ORDER_HIST,
        vec![
            Column::new(ORDER_ID, DataType::Integer).not_null(),
            Column::new(HIST_TS, DataType::Timestamp).not_null(),
            Column::new(PATIENT_ID, DataType::Integer).not_null(),
            Column::new(PRESCRIBER_ID, DataType::Integer).not_null(),
            Column::new(GROUP_NO, DataType::Integer),
            Column::new("status", DataType::Text),
        ],
    ));

    // Live and pending orders reference the same shared objects.
    for name in [ORDER_LIVE, ORDER_QUEUE] {
        catalog.push(TableSchema::new(
            name,
            vec![
                Column::new(ORDER_ID, DataType::Integer).not_null(),
                Column::new(PATIENT_ID, DataType::Integer).not_null(),
                Column::new(PRESCRIBER_ID, DataType::Integer).not_null(),
                Column::new(GROUP_NO, DataType::Integer),
                Column::new("status", DataType::Text),
            ],
        ));
    }

    for name in OWNED_DEPENDENT_TABLES {
        catalog.push(owned_dependent(name));
    }

    catalog.push(hist_assoc(ORDER_IMAGE_HIST, IMAGE_ID, DataType::Uuid));
    catalog.push(hist_assoc(ORDER_IMAGE_LEGACY, IMAGE_NO, DataType::Integer));
    catalog.push(TableSchema::new(
        IMAGE,
        vec![
            Column::new(IMAGE_ID, DataType::Uuid).not_null(),
            Column::new(ARCHIVED, DataType::Boolean).not_null(),
            Column::new("path", DataType::Text),
        ],
    ));
    catalog.push(TableSchema::new(
        IMAGE_LEGACY,
        vec![
            Column::new(IMAGE_NO, DataType::Integer).not_null(),
            Column::new(ARCHIVED, DataType::Boolean).not_null(),
            Column::new("path", DataType::Text),
        ],
    ));

    catalog.push(hist_assoc(SCHEDULE_HIST, SCHEDULE_ID, DataType::Integer));
    catalog.push(TableSchema::new(
        SCHEDULE_DOSE,
        vec![
            Column::new(SCHEDULE_ID, DataType::Integer).not_null(),
            Column::new("dose", DataType::Text),
        ],
    ));
    catalog.push(TableSchema::new(
        SCHEDULE_DAY,
        vec![
            Column::new(SCHEDULE_ID, DataType::Integer).not_null(),
            Column::new("day_of_week", DataType::Integer),
        ],
    ));

    catalog.push(hist_assoc(
        ORDER_PAPERWORK_HIST,
        PAPERWORK_ID,
        DataType::Integer,
    ));
    catalog.push(TableSchema::new(
        PAPERWORK_SET,
        vec![
            Column::new(PAPERWORK_ID, DataType::Integer).not_null(),
            Column::new("kind", DataType::Text),
        ],
    ));

    catalog.push(hist_assoc(ORDER_REPLEN_HIST, REPLEN_ID, DataType::Integer));
    catalog.push(TableSchema::new(
        REPLEN_HIST,
        vec![
            Column::new(REPLEN_ID, DataType::Integer).not_null(),
            Column::new("canister", DataType::Text),
        ],
    ));
    catalog.push(TableSchema::new(
        REPLEN_LOT_HIST,
        vec![
            Column::new(REPLEN_ID, DataType::Integer).not_null(),
            Column::new("lot_code", DataType::Text),
        ],
    ));
    catalog.push(TableSchema::new(
        REPLEN_IMAGE,
        vec![
            Column::new(REPLEN_ID, DataType::Integer).not_null(),
            Column::new(IMAGE_ID, DataType::Uuid).not_null(),
        ],
    ));

    catalog.push(hist_assoc(ORDER_SHIPMENT_HIST, SHIPMENT_ID, DataType::Uuid));
    for name in SHIPMENT_DETAIL_TABLES {
        catalog.push(TableSchema::new(
            name,
            vec![
                Column::new(SHIPMENT_ID, DataType::Uuid).not_null(),
                Column::new("detail", DataType::Text),
            ],
        ));
    }
    catalog.push(TableSchema::new(
        SHIPMENT,
        vec![
            Column::new(SHIPMENT_ID, DataType::Uuid).not_null(),
            Column::new(MANIFEST_ID, DataType::Uuid),
        ],
    ));
    catalog.push(TableSchema::new(
        MANIFEST,
        vec![
            Column::new(MANIFEST_ID, DataType::Uuid).not_null(),
            Column::new(PALLET_ID, DataType::Uuid),
        ],
    ));
    catalog.push(TableSchema::new(
        PALLET,
        vec![
            Column::new(PALLET_ID, DataType::Uuid).not_null(),
            Column::new(LOAD_ID, DataType::Uuid),
        ],
    ));
    catalog.push(TableSchema::new(
        LOAD,
        vec![
            Column::new(LOAD_ID, DataType::Uuid).not_null(),
            Column::new("carrier", DataType::Text),
        ],
    ));

    catalog.push(TableSchema::new(
        PATIENT,
        vec![
            Column::new(PATIENT_ID, DataType::Integer).not_null(),
            Column::new("name", DataType::Text),
        ],
    ));
    catalog.push(TableSchema::new(
        PRESCRIBER,
        vec![
            Column::new(PRESCRIBER_ID, DataType::Integer).not_null(),
            Column::new("name", DataType::Text),
        ],
    ));
    catalog.push(TableSchema::new(
        RX_GROUP,
        vec![
            Column::new(GROUP_NO, DataType::Integer).not_null(),
            Column::new(PARENT_GROUP_NO, DataType::Integer),
        ],
    ));

    for name in ID_ONLY_TABLES {
        catalog.push(id_only(name));
    }

    catalog.push(TableSchema::new(
        AUDIT_REJECT,
        vec![
            Column::new(REJECT_ID, DataType::Integer).not_null(),
            Column::new(LOGGED_AT, DataType::Timestamp).not_null(),
            Column::new("reason", DataType::Text),
        ],
    ));

    catalog
}
