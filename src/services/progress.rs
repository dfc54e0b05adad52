//! Uppladdningsframsteg: uppladdade dokument mot krävda checklistobjekt

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{ChecklistItem, FileStatus, UploadedFile};

/// Nivå för färgsättning av framsteg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLevel {
    High,
    Medium,
    Low,
}

impl ProgressLevel {
    pub fn from_percentage(percentage: i64) -> Self {
        if percentage >= 80 {
            Self::High
        } else if percentage >= 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub total_items: usize,
    pub uploaded_count: usize,
    pub percentage: i64,
}

impl Progress {
    fn new(total_items: usize, uploaded_count: usize) -> Self {
        let percentage = if total_items == 0 {
            0
        } else {
            (uploaded_count as f64 / total_items as f64 * 100.0 + 0.5).floor() as i64
        };
        Self {
            total_items,
            uploaded_count,
            percentage,
        }
    }

    pub fn level(&self) -> ProgressLevel {
        ProgressLevel::from_percentage(self.percentage)
    }

    pub fn pending(&self) -> usize {
        self.total_items - self.uploaded_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectProgress {
    pub aspect: String,
    #[serde(flatten)]
    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitProgress {
    pub unit: String,
    #[serde(flatten)]
    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearProgress {
    pub year: i32,
    pub overall: Progress,
    /// Sorterade efter framsteg, högst först
    pub aspects: Vec<AspectProgress>,
    pub units: Vec<UnitProgress>,
}

impl YearProgress {
    /// Beräkna framsteg för ett år. Ett objekt räknas som uppladdat om någon
    /// uppladdad fil för året pekar på det.
    pub fn compute(year: i32, items: &[&ChecklistItem], files: &[&UploadedFile]) -> Self {
        let uploaded: HashSet<i64> = files
            .iter()
            .filter(|f| f.year == year && f.status == FileStatus::Uploaded)
            .filter_map(|f| f.checklist_id)
            .collect();

        let items: Vec<&ChecklistItem> = items.iter().copied().filter(|i| i.year == year).collect();
        let overall = count_uploaded(&items, &uploaded);

        let mut aspects: Vec<AspectProgress> = group_names(items.iter().map(|i| i.aspect.as_str()))
            .into_iter()
            .map(|aspect| {
                let group: Vec<&ChecklistItem> =
                    items.iter().copied().filter(|i| i.aspect == aspect).collect();
                AspectProgress {
                    progress: count_uploaded(&group, &uploaded),
                    aspect,
                }
            })
            .collect();
        aspects.sort_by(|a, b| b.progress.percentage.cmp(&a.progress.percentage));

        let units = group_names(items.iter().filter_map(|i| i.assigned_unit.as_deref()))
            .into_iter()
            .map(|unit| {
                let group: Vec<&ChecklistItem> = items
                    .iter()
                    .copied()
                    .filter(|i| i.assigned_unit.as_deref() == Some(unit.as_str()))
                    .collect();
                UnitProgress {
                    progress: count_uploaded(&group, &uploaded),
                    unit,
                }
            })
            .collect();

        Self {
            year,
            overall,
            aspects,
            units,
        }
    }

    pub fn aspect(&self, name: &str) -> Option<&AspectProgress> {
        self.aspects.iter().find(|a| a.aspect == name)
    }
}

fn count_uploaded(items: &[&ChecklistItem], uploaded: &HashSet<i64>) -> Progress {
    let done = items
        .iter()
        .filter(|i| i.id.is_some_and(|id| uploaded.contains(&id)))
        .count();
    Progress::new(items.len(), done)
}

/// Unika namn i den ordning de först förekommer
fn group_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for name in names {
        if !seen.iter().any(|s: &String| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}
