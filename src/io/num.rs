//! Conversion of `f32` values from and to their STL representations.
//!
//! Binary STL stores floats as little endian IEEE-754 bit patterns, which
//! round trip exactly. ASCII STL stores them as text; see [`format_f32`] for
//! the exact format we write.

use std::{
    fmt::Write as _,
    io::{self, Write},
    num::ParseFloatError,
};

use byteorder::{ByteOrder, LittleEndian};


/// Values with a decimal exponent in `MIN_FIXED_EXP..MAX_FIXED_EXP` are
/// written in fixed-point notation, all others in scientific notation.
const MIN_FIXED_EXP: i32 = -4;
const MAX_FIXED_EXP: i32 = 6;

/// Reads a little endian `f32` from the first four bytes of `data`.
#[inline(always)]
pub fn read_f32_le(data: &[u8]) -> f32 {
    LittleEndian::read_f32(data)
}

/// Writes `v` as little endian `f32` into the first four bytes of `out`.
#[inline(always)]
pub fn write_f32_le(out: &mut [u8], v: f32) {
    LittleEndian::write_f32(out, v)
}

/// Reads three consecutive little endian `f32`s.
#[inline(always)]
pub fn read_vec3_le(data: &[u8]) -> [f32; 3] {
    [
        read_f32_le(&data[0..]),
        read_f32_le(&data[4..]),
        read_f32_le(&data[8..]),
    ]
}

/// Writes three consecutive little endian `f32`s.
#[inline(always)]
pub fn write_vec3_le(out: &mut [u8], [x, y, z]: [f32; 3]) {
    write_f32_le(&mut out[0..4], x);
    write_f32_le(&mut out[4..8], y);
    write_f32_le(&mut out[8..12], z);
}

/// Parses an ASCII STL float.
///
/// The value is parsed with 64 bit precision and then narrowed to `f32`.
/// Values outside of the `f32` range silently turn into infinity.
pub fn parse_f32(s: &str) -> Result<f32, ParseFloatError> {
    s.parse::<f64>().map(|v| v as f32)
}

/// Formats `v` the way it is written into ASCII STL files.
///
/// The STL format description only says floats look like `1.23456E+789`. In the
/// real world they are encoded all over the place, so we pick something
/// short that still round trips exactly:
///
/// - Start with the shortest digit sequence that parses back to the very
///   same `f32`. It is written in fixed-point notation if the decimal
///   exponent is in `-4..6` and in scientific notation (`d.ddde±XX`, at least
///   two exponent digits) otherwise. This is the "general" format of C's and
///   Go's `%g` with shortest precision.
/// - If `v` is an integer and writing it as plain integer is strictly
///   shorter, the integer is used instead.
///
/// Examples: `1.0 -> "1"`, `100000.0 -> "100000"`, `1000000.0 -> "1e+06"`,
/// `1234567.0 -> "1234567"`, `45.754 -> "45.754"`, `5e-10 -> "5e-10"`.
/// Negative zero is written as `0`. Non-finite values are written as `NaN`,
/// `+Inf` and `-Inf`.
pub fn format_f32(v: f32) -> String {
    let general = format_general(v);

    // `i64` can represent every integral `f32` below 2^63. Above that, the
    // general form is way shorter anyway.
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e18 {
        let int = (v as i64).to_string();
        if int.len() < general.len() {
            return int;
        }
    }

    general
}

/// Writes [`format_f32(v)`](format_f32) into `w`.
pub fn write_f32(w: &mut impl Write, v: f32) -> Result<(), io::Error> {
    w.write_all(format_f32(v).as_bytes())
}

/// Shortest round trip representation in `%g` style.
fn format_general(v: f32) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.into();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.into();
    }

    // `{:e}` gives us the shortest round trip digits, e.g. `-4.5754e1`.
    let sci = format!("{:e}", v);
    let (mantissa, exp) = match sci.find('e') {
        Some(pos) => (&sci[..pos], &sci[pos + 1..]),
        None => (&sci[..], "0"),
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();

    let mut out = String::with_capacity(16);
    if v.is_sign_negative() {
        out.push('-');
    }

    if exp < MIN_FIXED_EXP || exp >= MAX_FIXED_EXP {
        out.push(digits[0] as char);
        if digits.len() > 1 {
            out.push('.');
            out.extend(digits[1..].iter().map(|&d| d as char));
        }
        let sign = if exp < 0 { '-' } else { '+' };
        let _ = write!(out, "e{}{:02}", sign, exp.abs());
    } else if exp < 0 {
        out.push_str("0.");
        out.extend((0..-exp - 1).map(|_| '0'));
        out.extend(digits.iter().map(|&d| d as char));
    } else {
        // Number of digits before the decimal point.
        let int_len = exp as usize + 1;
        for i in 0..int_len {
            out.push(digits.get(i).map_or('0', |&d| d as char));
        }
        if digits.len() > int_len {
            out.push('.');
            out.extend(digits[int_len..].iter().map(|&d| d as char));
        }
    }

    out
}
