use thiserror::Error;
use time::{Date, Duration, PrimitiveDateTime, Time};

use crate::core::time::end_of_day;
use crate::db::models::Exam;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ScheduleError {
    #[error("min_submit_time must be after start_time")]
    MinSubmitNotAfterStart,
    #[error("min_submit_time must not be before start_time")]
    MinSubmitBeforeStart,
    #[error("end_time must not be before min_submit_time")]
    EndBeforeMinSubmit,
    #[error("exam lasting {minutes} minutes cannot start at {start} without running past midnight")]
    CrossesMidnight { start: Time, minutes: i64 },
}

/// One exam day: the window `[start_time, end_time]` on `start_date`, with
/// submissions allowed from `min_submit_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExamSchedule {
    pub(crate) start_date: Date,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) min_submit_time: Time,
}

impl ExamSchedule {
    /// Schedule for an exam that has not run yet: `start < min_submit <= end`.
    pub(crate) fn planned(
        start_date: Date,
        start_time: Time,
        end_time: Time,
        min_submit_time: Time,
    ) -> Result<Self, ScheduleError> {
        if min_submit_time <= start_time {
            return Err(ScheduleError::MinSubmitNotAfterStart);
        }
        if end_time < min_submit_time {
            return Err(ScheduleError::EndBeforeMinSubmit);
        }

        Ok(Self { start_date, start_time, end_time, min_submit_time })
    }

    /// Schedule as left behind by a run. Ending early can collapse the window
    /// onto its start, so only `start <= min_submit <= end` is required.
    pub(crate) fn recorded(
        start_date: Date,
        start_time: Time,
        end_time: Time,
        min_submit_time: Time,
    ) -> Result<Self, ScheduleError> {
        if min_submit_time < start_time {
            return Err(ScheduleError::MinSubmitBeforeStart);
        }
        if end_time < min_submit_time {
            return Err(ScheduleError::EndBeforeMinSubmit);
        }

        Ok(Self { start_date, start_time, end_time, min_submit_time })
    }

    pub(crate) fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub(crate) fn submit_offset(&self) -> Duration {
        self.min_submit_time - self.start_time
    }

    fn starts_at(&self) -> PrimitiveDateTime {
        PrimitiveDateTime::new(self.start_date, self.start_time)
    }

    /// Moves the window to begin at `now`, keeping its length and the
    /// min-submit offset. Fails if the shifted window would end on a later day.
    pub(crate) fn reanchor(&self, now: PrimitiveDateTime) -> Result<Self, ScheduleError> {
        let duration = self.duration();
        let crosses = || ScheduleError::CrossesMidnight {
            start: now.time(),
            minutes: duration.whole_minutes(),
        };

        let end = now.checked_add(duration).ok_or_else(crosses)?;
        if end.date() != now.date() {
            return Err(crosses());
        }
        let min_submit = now.checked_add(self.submit_offset()).ok_or_else(crosses)?;

        Ok(Self {
            start_date: now.date(),
            start_time: now.time(),
            end_time: end.time(),
            min_submit_time: min_submit.time(),
        })
    }

    /// Closes the window at `now`. `now` is held inside the exam day; a
    /// min-submit still ahead of the close is pulled back to it.
    pub(crate) fn close(&self, now: PrimitiveDateTime) -> Self {
        let latest = end_of_day(self.start_date).max(self.starts_at());
        let closed_at = now.max(self.starts_at()).min(latest);
        let min_submit = PrimitiveDateTime::new(self.start_date, self.min_submit_time);

        let min_submit_time =
            if min_submit > closed_at { closed_at.time() } else { self.min_submit_time };

        Self {
            start_date: self.start_date,
            start_time: self.start_time,
            end_time: closed_at.time(),
            min_submit_time,
        }
    }
}

impl From<&Exam> for ExamSchedule {
    fn from(exam: &Exam) -> Self {
        Self {
            start_date: exam.start_date,
            start_time: exam.start_time,
            end_time: exam.end_time,
            min_submit_time: exam.min_submit_time,
        }
    }
}
