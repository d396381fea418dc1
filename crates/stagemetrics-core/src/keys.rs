//! Reserved counter and annotation keys shared with renderers and serializers.
//!
//! These strings are part of the interchange contract; do not change them.

/// Counter key for the number of elements (bulk-weighted) a stage handled.
pub const ELEMENT_COUNT_ID: &str = "elementCount";

/// Counter key for the number of traversers (units of work) a stage handled.
pub const TRAVERSER_COUNT_ID: &str = "traverserCount";

/// Annotation key the aggregator writes the percent-of-total duration under.
pub const PERCENT_DURATION_KEY: &str = "percentDur";
