//! GNN-benchmark dataset text format parser and fold splitting.
//!
//! The format is line-based:
//!
//! ```text
//! <num_graphs>
//! <num_nodes> <label>            # per graph
//! <tag> <degree> <nbr> <nbr> ... # per node, `degree` neighbor indices
//! ```
//!
//! Graph labels and node tags are arbitrary integers in the file; both are
//! densified to contiguous indices. Labels map in first-seen order. Tags
//! are densified in two steps: a first-seen pass while reading, then —
//! after the optional `degree_as_tag` replacement — a final ascending-order
//! pass over the set of tags actually used, which yields the one-hot
//! indices the model consumes.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::Graph;
use crate::error::Error;

/// Error type for dataset parsing.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEnd(&'static str),
    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },
}

/// A parsed dataset: graphs plus the vocabulary sizes the model needs.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All graphs, in file order.
    pub graphs: Vec<Graph>,
    /// Number of distinct graph labels.
    pub num_classes: usize,
    /// One-hot tag cardinality (the model's input dimension).
    pub num_tags: usize,
}

struct LineReader<R> {
    inner: R,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    fn next_line(&mut self, context: &'static str) -> Result<String, DatasetError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = self.inner.read_line(&mut buf)?;
            if n == 0 {
                return Err(DatasetError::UnexpectedEnd(context));
            }
            self.line += 1;
            if !buf.trim().is_empty() {
                return Ok(buf);
            }
        }
    }

    fn invalid(&self, message: impl Into<String>) -> DatasetError {
        DatasetError::Invalid {
            line: self.line,
            message: message.into(),
        }
    }
}

fn parse_ints(s: &str) -> Option<Vec<i64>> {
    s.split_whitespace().map(|t| t.parse().ok()).collect()
}

/// Load a dataset from a file path.
pub fn load_dataset_path<P: AsRef<Path>>(
    path: P,
    degree_as_tag: bool,
) -> Result<Dataset, DatasetError> {
    load_dataset(BufReader::new(File::open(path)?), degree_as_tag)
}

/// Load a dataset from any buffered reader.
///
/// With `degree_as_tag`, node tags from the file are discarded and every
/// node is tagged with its degree instead (used for datasets that carry no
/// meaningful tags).
pub fn load_dataset<R: BufRead>(reader: R, degree_as_tag: bool) -> Result<Dataset, DatasetError> {
    let mut lines = LineReader {
        inner: reader,
        line: 0,
    };

    let header = lines.next_line("graph count")?;
    let num_graphs: usize = header
        .trim()
        .parse()
        .map_err(|_| lines.invalid(format!("expected graph count, got `{}`", header.trim())))?;

    let mut label_map: HashMap<i64, usize> = HashMap::new();
    let mut tag_map: HashMap<i64, usize> = HashMap::new();
    let mut graphs = Vec::with_capacity(num_graphs);
    let mut graph_tags: Vec<Vec<usize>> = Vec::with_capacity(num_graphs);

    for _ in 0..num_graphs {
        let line = lines.next_line("graph header")?;
        let header = parse_ints(&line)
            .filter(|v| v.len() == 2)
            .ok_or_else(|| lines.invalid(format!("expected `<nodes> <label>`, got `{}`", line.trim())))?;
        let num_nodes = usize::try_from(header[0])
            .map_err(|_| lines.invalid("negative node count"))?;
        let next_label = label_map.len();
        let label = *label_map.entry(header[1]).or_insert(next_label);

        let mut graph = Graph::new(label, num_nodes);
        let mut tags = Vec::with_capacity(num_nodes);
        for node in 0..num_nodes {
            let line = lines.next_line("node row")?;
            let row = parse_ints(&line)
                .ok_or_else(|| lines.invalid(format!("non-integer token in `{}`", line.trim())))?;
            if row.len() < 2 {
                return Err(lines.invalid("node row needs at least `<tag> <degree>`"));
            }
            let degree = usize::try_from(row[1])
                .map_err(|_| lines.invalid("negative neighbor count"))?;
            if row.len() != degree + 2 {
                return Err(lines.invalid(format!(
                    "node row declares {} neighbors but lists {}",
                    degree,
                    row.len() - 2
                )));
            }
            let next_tag = tag_map.len();
            tags.push(*tag_map.entry(row[0]).or_insert(next_tag));
            for &nbr in &row[2..] {
                let nbr = usize::try_from(nbr)
                    .ok()
                    .filter(|&v| v < num_nodes)
                    .ok_or_else(|| {
                        lines.invalid(format!("neighbor {nbr} out of range for {num_nodes} nodes"))
                    })?;
                graph.add_edge(node, nbr);
            }
        }
        graphs.push(graph);
        graph_tags.push(tags);
    }

    if degree_as_tag {
        for (graph, tags) in graphs.iter_mut().zip(graph_tags.iter_mut()) {
            for (node, tag) in tags.iter_mut().enumerate() {
                *tag = graph.degree(node);
            }
        }
    }

    // Final densification: ascending order over the tags actually used.
    let tag_set: BTreeSet<usize> = graph_tags.iter().flatten().copied().collect();
    let tag_index: HashMap<usize, usize> = tag_set.iter().enumerate().map(|(i, &t)| (t, i)).collect();
    for (graph, tags) in graphs.iter_mut().zip(graph_tags.iter()) {
        let features = tags
            .iter()
            .enumerate()
            .map(|(node, tag)| (node, tag_index[tag]))
            .collect();
        graph.set_node_features(features);
    }

    Ok(Dataset {
        graphs,
        num_classes: label_map.len(),
        num_tags: tag_set.len(),
    })
}

/// Seeded k-fold split over `len` items.
///
/// Shuffles `0..len` with a seeded generator and takes fold `fold` of
/// `num_folds` (near-)equal slices as the test set; the rest is the train
/// set. The same `(len, num_folds, seed)` always produces the same folds,
/// and the `num_folds` test sets partition the index range.
pub fn k_fold_split(
    len: usize,
    num_folds: usize,
    fold: usize,
    seed: u64,
) -> crate::Result<(Vec<usize>, Vec<usize>)> {
    if num_folds < 2 {
        return Err(Error::InvalidConfig(format!(
            "k-fold split needs at least 2 folds, got {num_folds}"
        )));
    }
    if fold >= num_folds {
        return Err(Error::InvalidConfig(format!(
            "fold index {fold} out of range for {num_folds} folds"
        )));
    }

    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    // Fold f covers base items, plus one of the remainder for the first
    // `len % num_folds` folds.
    let base = len / num_folds;
    let rem = len % num_folds;
    let start = fold * base + fold.min(rem);
    let end = start + base + usize::from(fold < rem);

    let test = indices[start..end].to_vec();
    let train = indices[..start]
        .iter()
        .chain(indices[end..].iter())
        .copied()
        .collect();
    Ok((train, test))
}
