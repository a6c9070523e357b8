use crate::parsing::approximate_next_schedule;
use crate::sink::{Metric, Observation};
use crate::types::CronJobRecord;

use super::labels;

/// Maps a cron job to info, active count, suspend flag and schedule times.
///
/// The next schedule time is an approximation: it is only exported for
/// schedules whose minute field is `*/N`, as last schedule time plus N
/// minutes. Other schedule forms get no next-schedule series at all.
pub fn map_cronjob(cronjob: &CronJobRecord) -> Vec<Observation> {
    let key = labels([&cronjob.namespace, &cronjob.name]);
    let mut out = vec![
        Observation::info(Metric::CronJobInfo, key.clone()),
        Observation::new(
            Metric::CronJobStatusActive,
            key.clone(),
            cronjob.active_jobs as f64,
        ),
        Observation::flag(Metric::CronJobSpecSuspend, key.clone(), cronjob.suspend),
    ];

    if let Some(last) = cronjob.last_schedule_time {
        out.push(Observation::new(
            Metric::CronJobStatusLastScheduleTime,
            key.clone(),
            last,
        ));
    }
    if let Some(next) = approximate_next_schedule(&cronjob.schedule, cronjob.last_schedule_time) {
        out.push(Observation::new(Metric::CronJobNextScheduleTime, key, next));
    }
    out
}
