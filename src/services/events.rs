//! Typade händelser mellan lagren

use serde::Serialize;

use crate::models::{UploadedFile, YearCleanupStats};

/// Händelser som sänds av `GcgHub`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HubEvent {
    /// Årets data har rensats lokalt (och i backend om `backend_ok`)
    YearDataCleaned {
        year: i32,
        cleanup_stats: Option<YearCleanupStats>,
        backend_ok: bool,
    },
    YearRemoved { year: i32 },
    /// Ett nytt år har skapats och eventuella rester har rensats
    YearCreatedFresh { year: i32 },
    StructureUpdated { year: Option<i32> },
    AssignmentsUpdated { year: i32 },
    ChecklistUpdated { year: i32 },
    FileUploaded { file: UploadedFile },
    UploadedFilesChanged { year: i32 },
    AssessmentSaved { year: i32, rows: usize },
    AoiUpdated { year: i32 },
}

impl HubEvent {
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::YearDataCleaned { year, .. }
            | Self::YearRemoved { year }
            | Self::YearCreatedFresh { year }
            | Self::AssignmentsUpdated { year }
            | Self::ChecklistUpdated { year }
            | Self::UploadedFilesChanged { year }
            | Self::AoiUpdated { year }
            | Self::AssessmentSaved { year, .. } => Some(*year),
            Self::FileUploaded { file } => Some(file.year),
            Self::StructureUpdated { year } => *year,
        }
    }
}

/// Identifierar en prenumeration så att den kan avslutas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn Fn(&HubEvent) + Send>;

/// Enkel synkron händelsebuss
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&HubEvent) + Send + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returnerar false om prenumerationen inte fanns
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    pub fn emit(&self, event: &HubEvent) {
        tracing::debug!("Händelse: {:?}", event);
        for (_, handler) in &self.handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
