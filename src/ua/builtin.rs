//! Well-known namespace-0 identifiers consumed by the node-management and
//! type-checking services.
//!
//! These mirror the `UA_NS0ID_*` constants referenced throughout
//! `ua_services_nodemanagement.c`. The standard-namespace bootstrap dataset
//! itself (the nodes these ids name) is an external collaborator (spec §1);
//! this module only fixes the numeric identifiers so that a bootstrap loader
//! and this core agree on them.

use crate::ua::NodeId;

macro_rules! ns0_ids {
    ($( ($name:ident, $value:expr) ),* $(,)?) => {
        $(
            #[must_use]
            pub const fn $name() -> NodeId {
                NodeId::ns0($value)
            }
        )*
    };
}

ns0_ids!(
    (boolean, 1),
    (sbyte, 2),
    (byte, 3),
    (int16, 4),
    (uint16, 5),
    (int32, 6),
    (uint32, 7),
    (int64, 8),
    (uint64, 9),
    (float, 10),
    (double, 11),
    (string, 12),
    (date_time, 13),
    (guid, 14),
    (byte_string, 15),
    (localized_text, 21),
    (structure, 22),
    (number, 26),
    (integer, 27),
    (uinteger, 28),
    (enumeration, 29),
    (references, 31),
    (non_hierarchical_references, 32),
    (hierarchical_references, 33),
    (has_child, 34),
    (organizes, 35),
    (has_event_source, 36),
    (has_modelling_rule, 37),
    (has_type_definition, 40),
    (has_subtype, 45),
    (has_property, 46),
    (has_component, 47),
    (aggregates, 44),
    (base_object_type, 58),
    (folder_type, 61),
    (base_variable_type, 62),
    (base_data_variable_type, 63),
    (property_type, 68),
    (base_data_type, 24),
    (objects_folder, 85),
);
