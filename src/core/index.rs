// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Multi-dimensional indexing.
//!
//! An [`Index`] addresses one logical unit of a dataset by naming a coordinate
//! for every dimension (time, channel, tile, z-plane, ...). An [`IndexSpace`]
//! declares the dimensions of a dataset in canonical order: the first
//! dimension varies slowest, the last fastest.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{DatasetError, Result};

/// Coordinate addressing one logical unit within a dataset.
///
/// Equality does not depend on the order in which coordinates were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    coords: BTreeMap<String, usize>,
}

impl Index {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a coordinate, builder style.
    pub fn with(mut self, dim: impl Into<String>, coord: usize) -> Self {
        self.coords.insert(dim.into(), coord);
        self
    }

    /// Set a coordinate in place.
    pub fn set(&mut self, dim: impl Into<String>, coord: usize) {
        self.coords.insert(dim.into(), coord);
    }

    /// Get the coordinate of a dimension.
    pub fn get(&self, dim: &str) -> Option<usize> {
        self.coords.get(dim).copied()
    }

    /// Number of named coordinates.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if no coordinate is set.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over `(dimension, coordinate)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.coords.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Combine two indices; coordinates of `other` win on conflict.
    pub fn merged(&self, other: &Index) -> Index {
        let mut coords = self.coords.clone();
        coords.extend(other.coords.iter().map(|(k, v)| (k.clone(), *v)));
        Index { coords }
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for Index {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        Index {
            coords: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (dim, coord)) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}={coord}")?;
        }
        write!(f, "}}")
    }
}

/// A named dimension and its extent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension name (e.g. "t", "c", "tile", "z")
    pub name: String,
    /// Number of coordinates along this dimension
    pub size: usize,
}

impl Dimension {
    /// Create a new dimension.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Ordered set of dimensions spanning every addressable unit of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Dimension>", into = "Vec<Dimension>")]
pub struct IndexSpace {
    dims: Vec<Dimension>,
}

impl IndexSpace {
    /// Create an index space from dimensions in canonical order.
    ///
    /// Dimension names must be unique and usable as file name components
    /// (non-empty, no path separators, no `..`). The number of units must fit
    /// in `usize`, ignoring empty dimensions.
    pub fn new(dims: Vec<Dimension>) -> Result<Self> {
        let mut total: usize = 1;
        for (i, dim) in dims.iter().enumerate() {
            check_dimension_name(&dim.name)?;
            if dims[..i].iter().any(|d| d.name == dim.name) {
                return Err(DatasetError::invalid_argument(
                    "dims",
                    format!("dimension '{}' declared twice", dim.name),
                ));
            }
            total = total.checked_mul(dim.size.max(1)).ok_or_else(|| {
                DatasetError::invalid_argument("dims", "number of units overflows usize")
            })?;
        }
        Ok(Self { dims })
    }

    /// Create an index space from `(name, size)` pairs.
    pub fn from_sizes(sizes: &[(&str, usize)]) -> Result<Self> {
        Self::new(
            sizes
                .iter()
                .map(|(name, size)| Dimension::new(*name, *size))
                .collect(),
        )
    }

    /// Dimensions in canonical order.
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    /// Look up a dimension by name.
    pub fn dim(&self, name: &str) -> Option<&Dimension> {
        self.dims.iter().find(|d| d.name == name)
    }

    /// Number of addressable units.
    ///
    /// A space without dimensions addresses exactly one unit (the empty index).
    pub fn len(&self) -> usize {
        self.dims.iter().map(|d| d.size).product()
    }

    /// Check if the space addresses no unit at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that `index` names every dimension exactly and stays in bounds.
    pub fn validate(&self, index: &Index) -> Result<()> {
        for (dim, _) in index.iter() {
            if self.dim(dim).is_none() {
                return Err(DatasetError::index(
                    index,
                    format!("unknown dimension '{dim}'"),
                ));
            }
        }
        for dim in &self.dims {
            match index.get(&dim.name) {
                None => {
                    return Err(DatasetError::index(
                        index,
                        format!("missing dimension '{}'", dim.name),
                    ))
                }
                Some(coord) if coord >= dim.size => {
                    return Err(DatasetError::index(
                        index,
                        format!("{} out of range (size {})", dim.name, dim.size),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Linear position of `index` in canonical order.
    pub fn offset(&self, index: &Index) -> Result<usize> {
        self.validate(index)?;
        let mut offset = 0;
        for dim in &self.dims {
            // validate() guarantees presence
            let coord = index.get(&dim.name).unwrap_or(0);
            offset = offset * dim.size + coord;
        }
        Ok(offset)
    }

    /// Index at a linear position, or `None` past the end.
    pub fn index_at(&self, offset: usize) -> Option<Index> {
        if offset >= self.len() {
            return None;
        }
        let mut rest = offset;
        let mut index = Index::new();
        for dim in self.dims.iter().rev() {
            index.set(dim.name.clone(), rest % dim.size);
            rest /= dim.size;
        }
        Some(index)
    }

    /// Coordinates of `index` in canonical dimension order.
    pub fn coords(&self, index: &Index) -> Result<Vec<usize>> {
        self.validate(index)?;
        Ok(self
            .dims
            .iter()
            .map(|d| index.get(&d.name).unwrap_or(0))
            .collect())
    }

    /// Enumerate every index in canonical order.
    ///
    /// Each call starts a fresh traversal.
    pub fn iter(&self) -> IndexIter<'_> {
        IndexIter {
            space: self,
            next: 0,
        }
    }

    /// Group the space by a subset of axes.
    ///
    /// Keys enumerate `axes` in the order given (first slowest). Each group holds
    /// every index sharing that key, in canonical order. This is how tiled
    /// datasets are walked tile by tile.
    pub fn group_by(&self, axes: &[&str]) -> Result<GroupIter> {
        let mut key_dims = Vec::with_capacity(axes.len());
        for axis in axes {
            let dim = self.dim(axis).ok_or_else(|| {
                DatasetError::invalid_argument("axes", format!("unknown dimension '{axis}'"))
            })?;
            key_dims.push(dim.clone());
        }
        let key_space = IndexSpace::new(key_dims)?;
        let rest_space = IndexSpace {
            dims: self
                .dims
                .iter()
                .filter(|d| !axes.contains(&d.name.as_str()))
                .cloned()
                .collect(),
        };
        Ok(GroupIter {
            key_space,
            rest_space,
            next: 0,
        })
    }
}

fn check_dimension_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains(['/', '\\', '\0'])
        || name.contains("..")
    {
        return Err(DatasetError::invalid_argument(
            "dims",
            format!("invalid dimension name '{}'", name.escape_debug()),
        ));
    }
    Ok(())
}

impl TryFrom<Vec<Dimension>> for IndexSpace {
    type Error = DatasetError;

    fn try_from(dims: Vec<Dimension>) -> Result<Self> {
        IndexSpace::new(dims)
    }
}

impl From<IndexSpace> for Vec<Dimension> {
    fn from(space: IndexSpace) -> Self {
        space.dims
    }
}

impl fmt::Display for IndexSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", dim.name, dim.size)?;
        }
        write!(f, ")")
    }
}

impl<'a> IntoIterator for &'a IndexSpace {
    type Item = Index;
    type IntoIter = IndexIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Canonical-order iterator over an [`IndexSpace`].
#[derive(Debug, Clone)]
pub struct IndexIter<'a> {
    space: &'a IndexSpace,
    next: usize,
}

impl Iterator for IndexIter<'_> {
    type Item = Index;

    fn next(&mut self) -> Option<Index> {
        let index = self.space.index_at(self.next)?;
        self.next += 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.space.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndexIter<'_> {}

/// Iterator over `(key, members)` groups produced by [`IndexSpace::group_by`].
#[derive(Debug, Clone)]
pub struct GroupIter {
    key_space: IndexSpace,
    rest_space: IndexSpace,
    next: usize,
}

impl Iterator for GroupIter {
    type Item = (Index, Vec<Index>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.key_space.index_at(self.next)?;
        self.next += 1;
        let members = self.rest_space.iter().map(|rest| key.merged(&rest)).collect();
        Some((key, members))
    }
}
