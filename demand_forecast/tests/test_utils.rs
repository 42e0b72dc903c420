use chrono::NaiveDate;
use demand_forecast::utils::{
    add_months, month_key, month_key_of, month_label, parse_transaction_date, quarter_of,
    split_month_key,
};
use rstest::rstest;

#[rstest]
#[case("15/03/2024 10:30:00", Some((2024, 3, 15)))]
#[case("15/03/2024 10:30:00.123", Some((2024, 3, 15)))]
#[case("01/12/2023 08:00", Some((2023, 12, 1)))]
#[case("05/02/2024", Some((2024, 2, 5)))]
#[case("2024-02-05", Some((2024, 2, 5)))]
#[case("2024-02-05T08:15:00", Some((2024, 2, 5)))]
#[case("  ", None)]
#[case("ayer", None)]
#[case("32/01/2024", None)]
fn test_parse_transaction_date(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32)>) {
    let expected = expected.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap());
    assert_eq!(parse_transaction_date(raw), expected);
}

#[rstest]
#[case(2023, 1, 0, (2023, 1))]
#[case(2023, 11, 2, (2024, 1))]
#[case(2023, 12, 13, (2025, 1))]
#[case(2024, 6, 24, (2026, 6))]
fn test_add_months(
    #[case] year: i32,
    #[case] month: u32,
    #[case] offset: u32,
    #[case] expected: (i32, u32),
) {
    assert_eq!(add_months(year, month, offset), expected);
}

#[test]
fn test_month_keys() {
    assert_eq!(month_key(2024, 3), 202403);
    assert_eq!(split_month_key(202403), (2024, 3));
    assert_eq!(
        month_key_of(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()),
        202312
    );
    assert_eq!(month_label(2025, 1), "2025-01");
}

#[rstest]
#[case(1, 1)]
#[case(3, 1)]
#[case(4, 2)]
#[case(9, 3)]
#[case(12, 4)]
fn test_quarter_of(#[case] month: u32, #[case] quarter: u32) {
    assert_eq!(quarter_of(month), quarter);
}
