use crate::error::{ParseError, ParseErrorKind};

use super::{FaceCorner, IngestReport, VertexPool};

/// Accumulates pools and raw face corners one line at a time.
///
/// Unknown keywords (`#`, `o`, `g`, `s`, `usemtl`, ...) are ignored.
#[derive(Debug, Default)]
pub struct ObjScanner {
    pool: VertexPool,
    corners: Vec<FaceCorner>,
    report: IngestReport,
}

impl ObjScanner {
    /// Empty scanner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one source line. `line_no` is 1-based and only used for error
    /// reporting.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for malformed numbers or indices and for
    /// records with too few components.
    pub fn scan_line(
        &mut self,
        line_no: usize,
        line: &str,
    ) -> Result<(), ParseError> {
        self.report.lines += 1;

        let line = line.trim();
        let Some((keyword, rest)) = line.split_once(char::is_whitespace)
        else {
            return Ok(());
        };

        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(line_no, "v", rest)?;
                self.pool.positions.extend_from_slice(&[x, y, z]);
                self.report.positions += 1;
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(line_no, "vn", rest)?;
                self.pool.normals.extend_from_slice(&[x, y, z]);
                self.report.normals += 1;
            }
            "vt" => {
                let (u, v) = parse_tex_coord(line_no, rest)?;
                self.pool.tex_coords.extend_from_slice(&[u, 1.0 - v]);
                self.report.tex_coords += 1;
            }
            "f" => self.scan_face(line_no, rest)?,
            "mtllib" => {
                self.report
                    .material_libraries
                    .extend(rest.split_whitespace().map(str::to_owned));
            }
            _ => {}
        }
        Ok(())
    }

    fn scan_face(&mut self, line_no: usize, rest: &str) -> Result<(), ParseError> {
        let start = self.corners.len();
        for token in rest.split_whitespace() {
            let corner = self.parse_corner(line_no, token)?;
            self.corners.push(corner);
        }

        let found = self.corners.len() - start;
        if found < 3 {
            self.corners.truncate(start);
            return Err(ParseError {
                line: line_no,
                kind: ParseErrorKind::MissingComponent {
                    record: "f",
                    expected: 3,
                    found,
                },
            });
        }

        self.report.faces += 1;
        self.report.corners += found;
        if found > 3 {
            self.report.polygon_faces += 1;
        }
        Ok(())
    }

    /// Parse `pos[/uv][/normal]`, converting negative (relative) references
    /// to absolute 1-based indices against the current pool sizes.
    fn parse_corner(
        &self,
        line_no: usize,
        token: &str,
    ) -> Result<FaceCorner, ParseError> {
        let mut parts = token.split('/');
        let position = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid_index(line_no, token))?;
        let position = absolute(
            parse_index(line_no, position)?,
            self.pool.position_count(),
        );

        let tex_coord = match parts.next() {
            Some(s) if !s.is_empty() => Some(absolute(
                parse_index(line_no, s)?,
                self.pool.tex_coord_count(),
            )),
            _ => None,
        };
        let normal = match parts.next() {
            Some(s) if !s.is_empty() => Some(absolute(
                parse_index(line_no, s)?,
                self.pool.normal_count(),
            )),
            _ => None,
        };

        Ok(FaceCorner {
            position,
            tex_coord,
            normal,
        })
    }

    /// Lines scanned so far.
    #[must_use]
    pub fn lines_scanned(&self) -> usize {
        self.report.lines
    }

    /// Hand over the pool, corners, and counters.
    #[must_use]
    pub fn finish(self) -> (VertexPool, Vec<FaceCorner>, IngestReport) {
        (self.pool, self.corners, self.report)
    }
}

fn absolute(index: i64, count: usize) -> i64 {
    if index < 0 {
        count as i64 + index + 1
    } else {
        index
    }
}

fn parse_floats<const N: usize>(
    line_no: usize,
    record: &'static str,
    rest: &str,
) -> Result<[f32; N], ParseError> {
    let mut out = [0.0f32; N];
    let mut found = 0;
    for (slot, token) in out.iter_mut().zip(rest.split_whitespace()) {
        *slot = parse_float(line_no, token)?;
        found += 1;
    }
    if found < N {
        return Err(ParseError {
            line: line_no,
            kind: ParseErrorKind::MissingComponent {
                record,
                expected: N,
                found,
            },
        });
    }
    Ok(out)
}

/// `vt u [v [w]]`: a missing V counts as 0.
fn parse_tex_coord(line_no: usize, rest: &str) -> Result<(f32, f32), ParseError> {
    let mut tokens = rest.split_whitespace();
    let u = match tokens.next() {
        Some(t) => parse_float(line_no, t)?,
        None => {
            return Err(ParseError {
                line: line_no,
                kind: ParseErrorKind::MissingComponent {
                    record: "vt",
                    expected: 1,
                    found: 0,
                },
            })
        }
    };
    let v = match tokens.next() {
        Some(t) => parse_float(line_no, t)?,
        None => 0.0,
    };
    Ok((u, v))
}

fn parse_float(line_no: usize, token: &str) -> Result<f32, ParseError> {
    token.parse::<f32>().map_err(|_| ParseError {
        line: line_no,
        kind: ParseErrorKind::InvalidFloat(token.to_owned()),
    })
}

fn parse_index(line_no: usize, token: &str) -> Result<i64, ParseError> {
    token
        .parse::<i64>()
        .map_err(|_| invalid_index(line_no, token))
}

fn invalid_index(line_no: usize, token: &str) -> ParseError {
    ParseError {
        line: line_no,
        kind: ParseErrorKind::InvalidIndex(token.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Result<ObjScanner, ParseError> {
        let mut scanner = ObjScanner::new();
        for (i, line) in text.lines().enumerate() {
            scanner.scan_line(i + 1, line)?;
        }
        Ok(scanner)
    }

    #[test]
    fn dispatches_by_keyword() {
        let scanner = scan(
            "# comment\n\
             o model\n\
             v 1 2 3\n\
             v 4 5 6 0.5 0.5 0.5\n\
             vn 0 0 1\n\
             vt 0.25 0.1\n\
             usemtl stone\n\
             f 1/1/1 2/1/1 1/1/1\n",
        )
        .unwrap();
        let (pool, corners, report) = scanner.finish();
        assert_eq!(pool.positions, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(pool.normals, vec![0.0, 0.0, 1.0]);
        assert_eq!(corners.len(), 3);
        assert_eq!(report.lines, 8);
        assert_eq!(report.faces, 1);
    }

    #[test]
    fn flips_v_coordinate() {
        let (pool, _, _) = scan("vt 0.3 0.2\nvt 0.5\n").unwrap().finish();
        assert!((pool.tex_coords[0] - 0.3).abs() < 1e-6);
        assert!((pool.tex_coords[1] - 0.8).abs() < 1e-6);
        assert_eq!(pool.tex_coords[3], 1.0);
    }

    #[test]
    fn corner_forms() {
        let (_, corners, _) = scan(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\n\
             f 1 2/1 3//1\n",
        )
        .unwrap()
        .finish();
        assert_eq!(
            corners,
            vec![
                FaceCorner {
                    position: 1,
                    tex_coord: None,
                    normal: None
                },
                FaceCorner {
                    position: 2,
                    tex_coord: Some(1),
                    normal: None
                },
                FaceCorner {
                    position: 3,
                    tex_coord: None,
                    normal: Some(1)
                },
            ]
        );
    }

    #[test]
    fn negative_indices_are_relative() {
        let (_, corners, _) = scan("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n")
            .unwrap()
            .finish();
        let positions: Vec<i64> = corners.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn polygon_faces_are_counted_not_split() {
        let (_, corners, report) =
            scan("f 1 2 3 4\n").unwrap().finish();
        assert_eq!(corners.len(), 4);
        assert_eq!(report.polygon_faces, 1);
    }

    #[test]
    fn malformed_float_reports_line() {
        let err = scan("v 0 0 0\nv 1 abc 0\n").err().unwrap();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::InvalidFloat("abc".into()));
    }

    #[test]
    fn short_records_are_rejected() {
        let err = scan("v 1 2\n").err().unwrap();
        assert!(matches!(
            err.kind,
            ParseErrorKind::MissingComponent {
                record: "v",
                expected: 3,
                found: 2
            }
        ));

        let err = scan("f 1 2\n").err().unwrap();
        assert!(matches!(
            err.kind,
            ParseErrorKind::MissingComponent { record: "f", .. }
        ));
    }

    #[test]
    fn malformed_index_is_rejected() {
        let err = scan("f 1 x 3\n").err().unwrap();
        assert_eq!(err.kind, ParseErrorKind::InvalidIndex("x".into()));
    }

    #[test]
    fn records_material_libraries() {
        let (_, _, report) = scan("mtllib model.mtl\n").unwrap().finish();
        assert_eq!(report.material_libraries, vec!["model.mtl".to_owned()]);
    }
}
