//! DIMACS CNF format parser.
//!
//! Standard format used in SAT competitions.

use sextant_base::{Error, Formula, Result};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A DIMACS CNF formula.
#[derive(Debug, Clone)]
pub struct DimacsCnf {
    /// Number of variables.
    pub num_vars: usize,
    /// Clauses as vectors of literals.
    pub clauses: Vec<Vec<i64>>,
}

impl DimacsCnf {
    /// Parses DIMACS CNF from a reader.
    ///
    /// Clauses are `0`-terminated and may span lines. The `p cnf` header is
    /// optional; without it the variable count is the largest variable used.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut declared: Option<(usize, usize)> = None;
        let mut clauses = Vec::new();
        let mut clause = Vec::new();
        let mut max_var = 0usize;
        // Widest literal and its line, for a header that follows the clauses
        let mut widest: Option<(i64, usize)> = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let line_no = line_no + 1;

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('c') {
                continue;
            }

            // SATLIB files close the clause section with "%"
            if line.starts_with('%') {
                break;
            }

            // Parse header
            if line.starts_with('p') {
                if declared.is_some() {
                    return Err(parse_error(line_no, "duplicate 'p cnf' header"));
                }
                declared = Some(parse_header(line, line_no)?);
                if let Some((_, num_clauses)) = declared {
                    clauses.reserve(num_clauses);
                }
                continue;
            }

            // Parse clause literals
            for token in line.split_whitespace() {
                let lit: i64 = token
                    .parse()
                    .map_err(|e| parse_error(line_no, format!("invalid literal '{token}': {e}")))?;
                if lit == 0 {
                    if !clause.is_empty() {
                        clauses.push(std::mem::take(&mut clause));
                    }
                } else {
                    let var = lit.unsigned_abs() as usize;
                    if let Some((num_vars, _)) = declared {
                        if var > num_vars {
                            return Err(out_of_range(line_no, lit, num_vars));
                        }
                    }
                    if var > max_var {
                        max_var = var;
                        widest = Some((lit, line_no));
                    }
                    clause.push(lit);
                }
            }
        }

        // Keep a final clause whose terminating 0 is missing
        if !clause.is_empty() {
            clauses.push(clause);
        }

        let num_vars = match declared {
            Some((num_vars, num_clauses)) => {
                if let Some((lit, line_no)) = widest.filter(|_| max_var > num_vars) {
                    return Err(out_of_range(line_no, lit, num_vars));
                }
                if num_clauses != clauses.len() {
                    tracing::warn!(
                        "header declares {} clauses, found {}",
                        num_clauses,
                        clauses.len()
                    );
                }
                num_vars
            }
            None => max_var,
        };

        Ok(Self { num_vars, clauses })
    }

    /// Parses DIMACS CNF from a string.
    pub fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parses a DIMACS CNF file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Converts to DIMACS string.
    #[must_use]
    pub fn to_dimacs(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "p cnf {} {}", self.num_vars, self.clauses.len());
        for clause in &self.clauses {
            for lit in clause {
                let _ = write!(out, "{lit} ");
            }
            out.push_str("0\n");
        }
        out
    }

    /// Validates the clauses and converts them into a solver [`Formula`].
    pub fn into_formula(self) -> Result<Formula> {
        Formula::new(self.num_vars, self.clauses)
    }
}

fn parse_header(line: &str, line_no: usize) -> Result<(usize, usize)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 || parts[0] != "p" || parts[1] != "cnf" {
        return Err(parse_error(line_no, "expected 'p cnf <variables> <clauses>'"));
    }
    let num_vars = parts[2]
        .parse()
        .map_err(|e| parse_error(line_no, format!("invalid variable count: {e}")))?;
    let num_clauses = parts[3]
        .parse()
        .map_err(|e| parse_error(line_no, format!("invalid clause count: {e}")))?;
    Ok((num_vars, num_clauses))
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

fn out_of_range(line: usize, literal: i64, num_vars: usize) -> Error {
    parse_error(
        line,
        format!("literal {literal} exceeds the declared {num_vars} variables"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimacs() {
        let input = r"
c This is a comment
p cnf 3 2
1 -2 0
2 3 0
";
        let cnf = DimacsCnf::from_str(input).unwrap();
        assert_eq!(cnf.num_vars, 3);
        assert_eq!(cnf.clauses.len(), 2);
        assert_eq!(cnf.clauses[0], vec![1, -2]);
        assert_eq!(cnf.clauses[1], vec![2, 3]);
    }

    #[test]
    fn test_clause_spanning_lines() {
        let input = "p cnf 4 2\n1 2\n-3 0 4\n0\n";
        let cnf = DimacsCnf::from_str(input).unwrap();
        assert_eq!(cnf.clauses, vec![vec![1, 2, -3], vec![4]]);
    }

    #[test]
    fn test_missing_trailing_zero_keeps_clause() {
        let cnf = DimacsCnf::from_str("p cnf 2 2\n1 0\n-1 2").unwrap();
        assert_eq!(cnf.clauses, vec![vec![1], vec![-1, 2]]);
    }

    #[test]
    fn test_satlib_percent_terminator() {
        let input = "p cnf 3 1\n1 2 3 0\n%\n0\n\n";
        let cnf = DimacsCnf::from_str(input).unwrap();
        assert_eq!(cnf.clauses, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_headerless_uses_max_variable() {
        let cnf = DimacsCnf::from_str("1 -7 0\n3 0\n").unwrap();
        assert_eq!(cnf.num_vars, 7);
    }

    #[test]
    fn test_literal_out_of_declared_range() {
        let err = DimacsCnf::from_str("p cnf 2 2\n1 2 0\n1 -3 0\n4 0\n").unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("-3"), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_out_of_range_before_late_header() {
        let err = DimacsCnf::from_str("1 -5 0\np cnf 2 1\n").unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("-5"), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_token_reports_line() {
        let err = DimacsCnf::from_str("p cnf 2 1\n\n1 x 0\n").unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            DimacsCnf::from_str("p dnf 2 1\n1 0\n"),
            Err(Error::Parse { line: 1, .. })
        ));
        assert!(matches!(
            DimacsCnf::from_str("p cnf two 1\n1 0\n"),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_into_formula() {
        let formula = DimacsCnf::from_str("p cnf 2 2\n1 2 0\n-1 0\n")
            .unwrap()
            .into_formula()
            .unwrap();
        assert_eq!(formula.num_vars(), 2);
        assert_eq!(formula.clauses().len(), 2);
    }

    #[test]
    fn test_to_dimacs_reparses() {
        let cnf = DimacsCnf {
            num_vars: 3,
            clauses: vec![vec![1, -3], vec![2]],
        };
        let text = cnf.to_dimacs();
        assert!(text.starts_with("p cnf 3 2\n"));
        let back = DimacsCnf::from_str(&text).unwrap();
        assert_eq!(back.clauses, cnf.clauses);
    }
}
