// src/jalali.rs
//
// Gregorian to Jalali (Persian) conversion, following the standard jalaali
// breaks algorithm. Only the month number is needed by the allocation flow
// but the full date conversion is kept for completeness.

use chrono::{Datelike, Local};
use tracing::warn;

use crate::model::PERSIAN_MONTHS;

/// Years in which the pattern of leap years changes.
const BREAKS: [i64; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// Converts a Gregorian date to a Jalali (jy, jm, jd) triple.
pub fn to_jalali(gy: i64, gm: i64, gd: i64) -> (i64, i64, i64) {
    d2j(g2d(gy, gm, gd))
}

/// Name of the current Jalali month on the system calendar. Falls back to the
/// first month if the conversion ever lands out of range.
pub fn current_month_name() -> &'static str {
    let today = Local::now().date_naive();
    let (_, jm, _) = to_jalali(
        today.year() as i64,
        today.month() as i64,
        today.day() as i64,
    );
    if (1..=12).contains(&jm) {
        PERSIAN_MONTHS[(jm - 1) as usize]
    } else {
        warn!("Could not determine the current Jalali month, using the first month");
        PERSIAN_MONTHS[0]
    }
}

/// Leap information for a Jalali year: (leap offset days, Gregorian year,
/// March day of Farvardin 1).
fn jal_cal(jy: i64) -> (i64, i64, i64) {
    let gy = jy + 621;
    let mut leap_j = -14i64;
    let mut jp = BREAKS[0];
    let mut jump = 0i64;

    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += (jump / 33) * 8 + (jump % 33) / 4;
        jp = jm;
    }
    let mut n = jy - jp;

    leap_j += (n / 33) * 8 + ((n % 33) + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - ((gy / 100 + 1) * 3) / 4 - 150;
    let march = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + ((jump + 4) / 33) * 33;
    }
    let mut leap = (((n + 1) % 33) - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    (leap, gy, march)
}

/// Gregorian date to Julian day number.
fn g2d(gy: i64, gm: i64, gd: i64) -> i64 {
    let mut d =
        ((gy + (gm - 8) / 6 + 100100) * 1461) / 4 + (153 * ((gm + 9) % 12) + 2) / 5 + gd - 34840408;
    d = d - (((gy + 100100 + (gm - 8) / 6) / 100) * 3) / 4 + 752;
    d
}

/// Julian day number to Gregorian date.
fn d2g(jdn: i64) -> (i64, i64, i64) {
    let mut j = 4 * jdn + 139361631;
    j = j + (((4 * jdn + 183187720) / 146097) * 3 / 4) * 4 - 3908;
    let i = ((j % 1461) / 4) * 5 + 308;
    let gd = (i % 153) / 5 + 1;
    let gm = (i / 153) % 12 + 1;
    let gy = j / 1461 - 100100 + (8 - gm) / 6;
    (gy, gm, gd)
}

/// Julian day number to Jalali date.
fn d2j(jdn: i64) -> (i64, i64, i64) {
    let (gy, _, _) = d2g(jdn);
    let mut jy = gy - 621;
    let (leap, _, march) = jal_cal(jy);
    let jdn1f = g2d(gy, 3, march);

    let mut k = jdn - jdn1f;
    if k >= 0 {
        if k <= 185 {
            let jm = 1 + k / 31;
            let jd = k % 31 + 1;
            return (jy, jm, jd);
        }
        k -= 186;
    } else {
        jy -= 1;
        k += 179;
        if leap == 1 {
            k += 1;
        }
    }
    let jm = 7 + k / 30;
    let jd = k % 30 + 1;
    (jy, jm, jd)
}
