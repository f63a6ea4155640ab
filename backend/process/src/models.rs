use chrono::NaiveDate;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Newly filled days and the riddle id placed on each.
    pub scheduled: Vec<(NaiveDate, String)>,
    /// Days in range that already had a riddle.
    pub occupied_days: usize,
    /// Days left empty because the bank ran out.
    pub unfilled_days: usize,
    /// Bank riddles still unscheduled afterwards.
    pub unused: usize,
}
