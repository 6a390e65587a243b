use std::fmt;

use serde::{Deserialize, Serialize};

/// A screen coordinate in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Element rectangle as reported by UiAutomator: `[x1,y1][x2,y2]`.
///
/// Both corners are inclusive, matching how points are sampled and
/// hit-tested against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Bounds {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Parse any string carrying exactly four integers, e.g. `[0,0][100,50]`.
    pub fn parse(raw: &str) -> Option<Bounds> {
        let numbers = extract_integers(raw);
        match numbers.as_slice() {
            [x1, y1, x2, y2] => Some(Bounds::new(*x1, *y1, *x2, *y2)),
            _ => None,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Integer center, rounding toward negative infinity.
    pub fn center(&self) -> Point {
        Point::new(midpoint(self.x1, self.x2), midpoint(self.y1, self.y2))
    }

    pub fn contains(&self, point: Point) -> bool {
        self.x1 <= point.x && point.x <= self.x2 && self.y1 <= point.y && point.y <= self.y2
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}][{},{}]", self.x1, self.y1, self.x2, self.y2)
    }
}

fn midpoint(a: i32, b: i32) -> i32 {
    // the mean of two i32 values always fits back into i32
    (i64::from(a) + i64::from(b)).div_euclid(2) as i32
}

fn extract_integers(raw: &str) -> Vec<i32> {
    let mut numbers = Vec::new();
    let mut current = String::new();

    for c in raw.chars() {
        if c.is_ascii_digit() || (c == '-' && current.is_empty()) {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(n) = current.parse() {
                numbers.push(n);
            }
            current.clear();
        }
    }

    if let Ok(n) = current.parse() {
        numbers.push(n);
    }

    numbers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_signed_runs() {
        assert_eq!(extract_integers("[-5,10][20,-1]"), vec![-5, 10, 20, -1]);
        assert_eq!(extract_integers("[a,b]"), Vec::<i32>::new());
    }
}
