use crate::config::UrgencyCoefficients;
use crate::model::{Status, Task};
use time::OffsetDateTime;

const SECONDS_PER_DAY: f64 = 86_400.0;
const AGE_MAX_DAYS: f64 = 365.0;

impl Task {
    pub fn urgency(&mut self, coefficients: &UrgencyCoefficients, now: OffsetDateTime) -> f64 {
        if self.recalc_urgency {
            self.urgency_value = self.urgency_c(coefficients, now);
            self.recalc_urgency = false;
        }
        self.urgency_value
    }

    pub fn urgency_c(&self, coefficients: &UrgencyCoefficients, now: OffsetDateTime) -> f64 {
        let mut value = 0.0;
        value += coefficients.priority * self.urgency_priority();
        value += coefficients.project * self.urgency_project();
        value += coefficients.active * self.urgency_active();
        value += coefficients.scheduled * self.urgency_scheduled(now);
        value += coefficients.waiting * self.urgency_waiting();
        value += coefficients.blocked * self.urgency_blocked();
        value += coefficients.annotations * self.urgency_annotations();
        value += coefficients.tags * self.urgency_tags();
        value += coefficients.next * self.urgency_next();
        value += coefficients.due * self.urgency_due(now);
        value += coefficients.blocking * self.urgency_blocking();
        value += coefficients.age * self.urgency_age(now);
        value
    }

    fn urgency_priority(&self) -> f64 {
        match self.get("priority") {
            Some("H") => 1.0,
            Some("M") => 0.65,
            Some("L") => 0.3,
            _ => 0.0,
        }
    }

    fn urgency_project(&self) -> f64 {
        if self.has("project") { 1.0 } else { 0.0 }
    }

    fn urgency_active(&self) -> f64 {
        if self.has("start") { 1.0 } else { 0.0 }
    }

    fn urgency_scheduled(&self, now: OffsetDateTime) -> f64 {
        match self.get_date("scheduled") {
            Ok(Some(scheduled)) if scheduled <= now => 1.0,
            _ => 0.0,
        }
    }

    fn urgency_waiting(&self) -> f64 {
        match self.status() {
            Ok(Status::Waiting) => 1.0,
            _ => 0.0,
        }
    }

    fn urgency_blocked(&self) -> f64 {
        if self.is_blocked() { 1.0 } else { 0.0 }
    }

    fn urgency_annotations(&self) -> f64 {
        scaled_count(self.annotation_count())
    }

    fn urgency_tags(&self) -> f64 {
        scaled_count(self.tag_count())
    }

    fn urgency_next(&self) -> f64 {
        if self.has_tag("next") { 1.0 } else { 0.0 }
    }

    // Ramps from 0.2 fourteen days out to 1.0 a week overdue.
    fn urgency_due(&self, now: OffsetDateTime) -> f64 {
        let Ok(Some(due)) = self.get_date("due") else {
            return 0.0;
        };
        let days_overdue = (now - due).whole_seconds() as f64 / SECONDS_PER_DAY;
        if days_overdue >= 7.0 {
            1.0
        } else if days_overdue >= -14.0 {
            ((days_overdue + 14.0) * 0.8 / 21.0) + 0.2
        } else {
            0.2
        }
    }

    fn urgency_blocking(&self) -> f64 {
        if self.is_blocking() { 1.0 } else { 0.0 }
    }

    fn urgency_age(&self, now: OffsetDateTime) -> f64 {
        let Ok(Some(entry)) = self.get_date("entry") else {
            return 1.0;
        };
        let age_days = (now - entry).whole_seconds() as f64 / SECONDS_PER_DAY;
        (age_days / AGE_MAX_DAYS).clamp(0.0, 1.0)
    }
}

fn scaled_count(count: usize) -> f64 {
    match count {
        0 => 0.0,
        1 => 0.8,
        2 => 0.9,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use crate::config::UrgencyCoefficients;
    use crate::model::{Status, Task};
    use time::OffsetDateTime;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(seconds).unwrap()
    }

    fn now() -> OffsetDateTime {
        at(1_400_000_000)
    }

    fn one(term: &str) -> UrgencyCoefficients {
        let mut coefficients = UrgencyCoefficients::default();
        match term {
            "priority" => coefficients.priority = 1.0,
            "project" => coefficients.project = 1.0,
            "active" => coefficients.active = 1.0,
            "scheduled" => coefficients.scheduled = 1.0,
            "waiting" => coefficients.waiting = 1.0,
            "blocked" => coefficients.blocked = 1.0,
            "annotations" => coefficients.annotations = 1.0,
            "tags" => coefficients.tags = 1.0,
            "next" => coefficients.next = 1.0,
            "due" => coefficients.due = 1.0,
            "blocking" => coefficients.blocking = 1.0,
            "age" => coefficients.age = 1.0,
            _ => unreachable!(),
        }
        coefficients
    }

    #[test]
    fn disabled_coefficients_score_zero() {
        let mut task = Task::new();
        task.set("priority", "H");
        task.set("project", "home");
        task.add_tag("next");

        assert_eq!(task.urgency_c(&UrgencyCoefficients::default(), now()), 0.0);
    }

    #[test]
    fn priority_levels_are_ordered() {
        let coefficients = one("priority");
        let mut task = Task::new();

        let none = task.urgency_c(&coefficients, now());
        task.set("priority", "L");
        let low = task.urgency_c(&coefficients, now());
        task.set("priority", "M");
        let medium = task.urgency_c(&coefficients, now());
        task.set("priority", "H");
        let high = task.urgency_c(&coefficients, now());

        assert_eq!(none, 0.0);
        assert!(low > none && medium > low && high > medium);
        assert_eq!(high, 1.0);
    }

    #[test]
    fn presence_terms_score_one() {
        let mut task = Task::new();
        task.set("project", "home");
        task.set("start", "1399999999");
        task.set_status(Status::Waiting);
        task.set_blocked(true);
        task.set_blocking(true);
        task.add_tag("next");

        assert_eq!(task.urgency_c(&one("project"), now()), 1.0);
        assert_eq!(task.urgency_c(&one("active"), now()), 1.0);
        assert_eq!(task.urgency_c(&one("waiting"), now()), 1.0);
        assert_eq!(task.urgency_c(&one("blocked"), now()), 1.0);
        assert_eq!(task.urgency_c(&one("blocking"), now()), 1.0);
        assert_eq!(task.urgency_c(&one("next"), now()), 1.0);
    }

    #[test]
    fn scheduled_counts_only_once_reached() {
        let coefficients = one("scheduled");
        let mut task = Task::new();
        assert_eq!(task.urgency_c(&coefficients, now()), 0.0);

        task.set_number("scheduled", 1_400_000_500);
        assert_eq!(task.urgency_c(&coefficients, now()), 0.0);

        task.set_number("scheduled", 1_399_999_000);
        assert_eq!(task.urgency_c(&coefficients, now()), 1.0);
    }

    #[test]
    fn annotation_and_tag_counts_are_capped() {
        let coefficients = one("tags");
        let mut task = Task::new();
        assert_eq!(task.urgency_c(&coefficients, now()), 0.0);

        task.add_tag("one");
        assert_eq!(task.urgency_c(&coefficients, now()), 0.8);
        task.add_tag("two");
        assert_eq!(task.urgency_c(&coefficients, now()), 0.9);
        task.add_tag("three");
        assert_eq!(task.urgency_c(&coefficients, now()), 1.0);
        task.add_tag("four");
        assert_eq!(task.urgency_c(&coefficients, now()), 1.0);

        let coefficients = one("annotations");
        task.add_annotation("note", now());
        assert_eq!(task.urgency_c(&coefficients, now()), 0.8);
    }

    #[test]
    fn due_score_rises_as_deadline_nears() {
        let coefficients = one("due");
        let mut task = Task::new();
        assert_eq!(task.urgency_c(&coefficients, now()), 0.0);

        let day = 86_400;
        task.set_number("due", 1_400_000_000 + 30 * day);
        let far = task.urgency_c(&coefficients, now());
        assert_eq!(far, 0.2);

        task.set_number("due", 1_400_000_000 + 7 * day);
        let near = task.urgency_c(&coefficients, now());
        task.set_number("due", 1_400_000_000);
        let today = task.urgency_c(&coefficients, now());
        task.set_number("due", 1_400_000_000 - 10 * day);
        let overdue = task.urgency_c(&coefficients, now());

        assert!(far < near && near < today && today < overdue);
        assert_eq!(overdue, 1.0);
    }

    #[test]
    fn age_is_linear_and_capped() {
        let coefficients = one("age");
        let day = 86_400;

        let mut task = Task::new();
        task.set_number("entry", 1_400_000_000);
        assert_eq!(task.urgency_c(&coefficients, now()), 0.0);

        task.set_number("entry", 1_400_000_000 - 73 * day);
        let young = task.urgency_c(&coefficients, now());
        assert!((young - 0.2).abs() < 1e-9);

        task.set_number("entry", 1_400_000_000 - 1000 * day);
        assert_eq!(task.urgency_c(&coefficients, now()), 1.0);

        task.remove("entry");
        assert_eq!(task.urgency_c(&coefficients, now()), 1.0);
    }

    #[test]
    fn raising_a_coefficient_never_lowers_urgency() {
        let mut task = Task::new();
        task.set("description", "demo");
        task.set("priority", "M");
        task.set("project", "home");
        task.set_number("entry", 1_399_000_000);
        task.set_number("due", 1_400_100_000);
        task.add_tags(["errand", "next"]);
        task.add_annotation("note", at(1_399_500_000));
        task.set_blocked(true);
        task.set_blocking(true);
        task.set_status(Status::Waiting);
        task.set_number("scheduled", 1_399_999_000);
        task.set_number("start", 1_399_999_500);

        let terms = [
            "priority", "project", "active", "scheduled", "waiting", "blocked",
            "annotations", "tags", "next", "due", "blocking", "age",
        ];
        let baseline = task.urgency_c(&UrgencyCoefficients::default(), now());
        for term in terms {
            assert!(
                task.urgency_c(&one(term), now()) >= baseline,
                "term {term} lowered urgency"
            );
        }
    }

    #[test]
    fn urgency_is_cached_until_mutation() {
        let coefficients = one("project");
        let mut task = Task::new();
        task.set("project", "home");

        assert_eq!(task.urgency(&coefficients, now()), 1.0);

        // Cached value survives even a different coefficient table.
        assert_eq!(task.urgency(&UrgencyCoefficients::default(), now()), 1.0);

        task.remove("project");
        assert_eq!(task.urgency(&coefficients, now()), 0.0);

        task.set_blocked(true);
        let coefficients = one("blocked");
        assert_eq!(task.urgency(&coefficients, now()), 1.0);
    }

    #[test]
    fn urgency_is_deterministic_for_fixed_now() {
        let coefficients = UrgencyCoefficients::standard();
        let mut task = Task::new();
        task.set("description", "demo");
        task.set("priority", "H");
        task.set_number("entry", 1_399_000_000);
        task.set_number("due", 1_400_100_000);
        task.add_tag("next");

        let first = task.urgency_c(&coefficients, now());
        let second = task.urgency_c(&coefficients, now());
        assert_eq!(first, second);
        assert!(first > 0.0);
    }
}
