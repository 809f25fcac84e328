//! Read-only status snapshot

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub name: String,
    pub page_size: usize,
    pub num_pages: usize,
    pub data_size: usize,
    pub active_count: u32,
    pub max_allowed: u32,
}

impl StatusSnapshot {
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.num_pages * self.page_size
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "device: {}", self.name)?;
        writeln!(f, "page size: {}", self.page_size)?;
        writeln!(f, "pages: {}", self.num_pages)?;
        writeln!(f, "data size: {}", self.data_size)?;
        writeln!(f, "capacity: {}", self.capacity())?;
        writeln!(f, "handles: {}/{}", self.active_count, self.max_allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_text() {
        let status = StatusSnapshot {
            name: "rd0".to_string(),
            page_size: 4096,
            num_pages: 2,
            data_size: 5000,
            active_count: 1,
            max_allowed: 3,
        };
        assert_eq!(
            status.to_string(),
            "device: rd0\npage size: 4096\npages: 2\ndata size: 5000\ncapacity: 8192\nhandles: 1/3\n"
        );
    }
}
