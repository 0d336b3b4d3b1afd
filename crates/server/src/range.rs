#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

// Malformed Range headers are ignored rather than rejected, so they plan a
// full response; valid but unsatisfiable ranges plan a 416.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    Full,
    Partial(ByteRange),
    Unsatisfiable,
}

pub fn plan_range(header: Option<&str>, size: u64) -> RangePlan {
    let Some(value) = header else {
        return RangePlan::Full;
    };
    let value = value.trim();
    let Some(spec) = value.strip_prefix("bytes=") else {
        return RangePlan::Full;
    };
    // multiple ranges are valid HTTP but not worth supporting for audio
    if spec.contains(',') {
        return RangePlan::Full;
    }
    if size == 0 {
        return RangePlan::Unsatisfiable;
    }

    if let Some(suffix) = spec.strip_prefix('-') {
        let Ok(suffix) = suffix.parse::<u64>() else {
            return RangePlan::Full;
        };
        if suffix == 0 {
            return RangePlan::Unsatisfiable;
        }
        let start = size.saturating_sub(suffix);
        return RangePlan::Partial(ByteRange { start, end: size - 1 });
    }

    let mut parts = spec.splitn(2, '-');
    let start_str = parts.next().unwrap_or("");
    let end_str = parts.next().unwrap_or("");
    let Ok(start) = start_str.parse::<u64>() else {
        return RangePlan::Full;
    };
    if start >= size {
        return RangePlan::Unsatisfiable;
    }
    let end = if end_str.is_empty() {
        size - 1
    } else {
        match end_str.parse::<u64>() {
            Ok(end) if end >= start => end.min(size - 1),
            _ => return RangePlan::Full,
        }
    };
    RangePlan::Partial(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::{plan_range, ByteRange, RangePlan};

    #[test]
    fn no_header_plans_a_full_response() {
        assert_eq!(plan_range(None, 100), RangePlan::Full);
    }

    #[test]
    fn open_ended_ranges_run_to_the_last_byte() {
        assert_eq!(
            plan_range(Some("bytes=0-"), 100),
            RangePlan::Partial(ByteRange { start: 0, end: 99 })
        );
        assert_eq!(
            plan_range(Some("bytes=40-"), 100),
            RangePlan::Partial(ByteRange { start: 40, end: 99 })
        );
    }

    #[test]
    fn closed_ranges_are_honored() {
        let plan = plan_range(Some("bytes=10-19"), 100);
        assert_eq!(plan, RangePlan::Partial(ByteRange { start: 10, end: 19 }));
        if let RangePlan::Partial(range) = plan {
            assert_eq!(range.len(), 10);
        }
    }

    #[test]
    fn end_overflow_is_clamped_to_the_file() {
        assert_eq!(
            plan_range(Some("bytes=90-200"), 100),
            RangePlan::Partial(ByteRange { start: 90, end: 99 })
        );
    }

    #[test]
    fn suffix_ranges_serve_the_tail() {
        assert_eq!(
            plan_range(Some("bytes=-10"), 100),
            RangePlan::Partial(ByteRange { start: 90, end: 99 })
        );
        // a suffix longer than the file serves everything
        assert_eq!(
            plan_range(Some("bytes=-500"), 100),
            RangePlan::Partial(ByteRange { start: 0, end: 99 })
        );
    }

    #[test]
    fn malformed_headers_fall_back_to_full() {
        assert_eq!(plan_range(Some("bytes=0-1,2-3"), 100), RangePlan::Full);
        assert_eq!(plan_range(Some("bytes=10-5"), 100), RangePlan::Full);
        assert_eq!(plan_range(Some("bytes=abc-"), 100), RangePlan::Full);
        assert_eq!(plan_range(Some("items=0-1"), 100), RangePlan::Full);
        assert_eq!(plan_range(Some("bytes=-"), 100), RangePlan::Full);
    }

    #[test]
    fn out_of_bounds_starts_are_unsatisfiable() {
        assert_eq!(plan_range(Some("bytes=100-"), 100), RangePlan::Unsatisfiable);
        assert_eq!(plan_range(Some("bytes=0-"), 0), RangePlan::Unsatisfiable);
        assert_eq!(plan_range(Some("bytes=-0"), 100), RangePlan::Unsatisfiable);
    }
}
