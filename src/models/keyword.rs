//! TaskJuggler keywords used by the model.

pub const PROJECT: &str = "project";
pub const RESOURCE: &str = "resource";
pub const TASK: &str = "task";
pub const BOOKING: &str = "booking";

pub const ALLOCATE: &str = "allocate";
pub const EFFORT: &str = "effort";
pub const DEPENDS: &str = "depends";
pub const PRIORITY: &str = "priority";
pub const START: &str = "start";

pub const TIMEZONE: &str = "timezone";
pub const OUTPUTDIR: &str = "outputdir";
pub const ICALREPORT: &str = "icalreport";
