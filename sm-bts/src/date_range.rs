use chrono::{Months, NaiveDate};
use sm_utils::dates::{first_of_month, is_feb_29};
use std::mem::replace;

/// Iterator over each day from the start date through the end date
/// (inclusive), skipping Feb 29: daily files have 365 slots per year.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DayRange(pub NaiveDate, pub NaiveDate);

impl Iterator for DayRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        while self.0 <= self.1 {
            let next = self.0.succ_opt()?;
            let current = replace(&mut self.0, next);
            if !is_feb_29(&current) {
                return Some(current);
            }
        }
        None
    }
}

/// Iterator over the first day of each month from the start month through
/// the end month (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct MonthRange(pub NaiveDate, pub NaiveDate);

impl MonthRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        MonthRange(first_of_month(&start), first_of_month(&end))
    }
}

impl Iterator for MonthRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0.checked_add_months(Months::new(1))?;
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}
