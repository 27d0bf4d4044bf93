use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

/// A persisted note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note that has passed validation but has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Applies a partial update. Absent fields are left untouched and
    /// `updated_at` always moves strictly forward.
    #[must_use]
    pub fn patched(
        mut self,
        title: Option<String>,
        content: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(content) = content {
            self.content = Some(content);
        }
        self.updated_at = now.max(self.updated_at + TimeDelta::microseconds(1));
        self
    }
}

/// Current time at the precision both backends can store.
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn note_at(ts: DateTime<Utc>) -> Note {
        Note {
            id: 1,
            title: "X".to_string(),
            content: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn patched_overwrites_only_present_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let note = note_at(ts).patched(
            None,
            Some("hi".to_string()),
            ts + TimeDelta::seconds(5),
        );

        assert_eq!(note.title, "X");
        assert_eq!(note.content.as_deref(), Some("hi"));
        assert_eq!(note.created_at, ts);
        assert_eq!(note.updated_at, ts + TimeDelta::seconds(5));
    }

    #[test]
    fn patched_keeps_content_when_absent() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut note = note_at(ts);
        note.content = Some("body".to_string());

        let note = note.patched(Some("Y".to_string()), None, ts + TimeDelta::seconds(1));

        assert_eq!(note.title, "Y");
        assert_eq!(note.content.as_deref(), Some("body"));
    }

    #[test]
    fn patched_advances_updated_at_even_when_clock_stalls() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let same_instant = note_at(ts).patched(None, None, ts);
        assert_eq!(same_instant.updated_at, ts + TimeDelta::microseconds(1));

        let clock_went_back = note_at(ts).patched(None, None, ts - TimeDelta::seconds(30));
        assert!(clock_went_back.updated_at > ts);
        assert!(clock_went_back.updated_at >= clock_went_back.created_at);
    }

    #[test]
    fn current_timestamp_has_microsecond_precision() {
        let now = current_timestamp();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }
}
