/// One candidate mini-program row from the registry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRecord {
    pub uuid: String,
    pub name: String,
}

/// Title and description extracted from a rendered verification page.
/// Either field is empty when the page carries no such element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageNotice {
    pub title: String,
    pub description: String,
}

/// Per-run counters reported once at the end of a detection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub scanned: u32,
    pub skipped: u32,
    pub flagged: u32,
    pub failed: u32,
}

impl RunSummary {
    pub fn record_scanned(&mut self) {
        self.scanned += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_flagged(&mut self) {
        self.flagged += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }
}
