//! Classification trees
//!
use std::collections::{HashMap, HashSet};

use ndarray::{Array1, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2};

use super::NodeIter;
use super::{DecisionTreeValidParams, SplitQuality};
use qfarm::{
    dataset::{AsTargets, Labels},
    error::{Error, Result},
    traits::*,
    DatasetBase, Float, Label,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Observations that reached a node
///
/// Every node sees the subset of training rows routed to it by the splits above. The subset is
/// stored as a boolean mask over all rows plus the number of visible rows.
struct RowMask {
    mask: Vec<bool>,
    nsamples: usize,
}

impl RowMask {
    /// Every row visible
    fn all(nsamples: usize) -> Self {
        RowMask {
            mask: vec![true; nsamples],
            nsamples,
        }
    }

    /// No row visible
    fn none(nsamples: usize) -> Self {
        RowMask {
            mask: vec![false; nsamples],
            nsamples: 0,
        }
    }

    fn mark(&mut self, idx: usize) {
        self.mask[idx] = true;
        self.nsamples += 1;
    }
}

/// One feature column in ascending order, paired with the row each value came from
struct SortedIndex<'a, F: Float> {
    feature_name: &'a str,
    sorted_values: Vec<(usize, F)>,
}

impl<'a, F: Float> SortedIndex<'a, F> {
    /// Sorts the values of the feature `feature_idx` in ascending order, keeping the index of
    /// the observation each value belongs to
    fn of_array_column(
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        feature_idx: usize,
        feature_name: &'a str,
    ) -> Self {
        let mut pairs: Vec<(usize, F)> = x
            .index_axis(Axis(1), feature_idx)
            .iter()
            .copied()
            .enumerate()
            .collect();
        pairs.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Greater));

        SortedIndex {
            sorted_values: pairs,
            feature_name,
        }
    }
}

/// Training view shared by every node during fitting
///
/// Labels are mapped to dense class indices once, so that class frequencies can be kept in a
/// plain vector whose order does not depend on hashing.
struct TrainingSet<'a, F: Float, L> {
    records: ArrayView2<'a, F>,
    classes: Vec<L>,
    class_of: Vec<usize>,
    weights: Vec<f32>,
}

impl<'a, F: Float, L: Label> TrainingSet<'a, F, L> {
    fn class_frequencies(&self, mask: &RowMask) -> Vec<f32> {
        let mut freqs = vec![0.0; self.classes.len()];
        for (idx, _) in mask.mask.iter().enumerate().filter(|(_, visible)| **visible) {
            freqs[self.class_of[idx]] += self.weights[idx];
        }

        freqs
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone)]
/// Leaf or internal node of a fitted tree
pub struct TreeNode<F, L> {
    feature_idx: usize,
    feature_name: String,
    split_value: F,
    impurity_decrease: F,
    left_child: Option<Box<TreeNode<F, L>>>,
    right_child: Option<Box<TreeNode<F, L>>>,
    leaf_node: bool,
    prediction: L,
    depth: usize,
}

impl<F: Float, L: Label> TreeNode<F, L> {
    fn empty_leaf(prediction: L, depth: usize) -> Self {
        TreeNode {
            feature_idx: 0,
            feature_name: "".to_string(),
            split_value: F::zero(),
            impurity_decrease: F::zero(),
            left_child: None,
            right_child: None,
            leaf_node: true,
            prediction,
            depth,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf_node
    }

    /// Distance from the root, the root has depth zero
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Label predicted by a leaf, `None` for internal nodes
    pub fn prediction(&self) -> Option<L> {
        if self.is_leaf() {
            Some(self.prediction.clone())
        } else {
            None
        }
    }

    /// Left child, then right child
    pub fn children(&self) -> Vec<&Option<Box<TreeNode<F, L>>>> {
        vec![&self.left_child, &self.right_child]
    }

    /// `(feature index, threshold, impurity decrease)` of the split
    pub fn split(&self) -> (usize, F, F) {
        (self.feature_idx, self.split_value, self.impurity_decrease)
    }

    /// Name of the split feature, `None` for leaves
    pub fn feature_name(&self) -> Option<&String> {
        if self.leaf_node {
            None
        } else {
            Some(&self.feature_name)
        }
    }

    /// Grow the subtree for the rows visible in `mask`
    fn fit(
        data: &TrainingSet<F, L>,
        mask: &RowMask,
        hyperparameters: &DecisionTreeValidParams<F, L>,
        sorted_indices: &[SortedIndex<F>],
        depth: usize,
    ) -> Self {
        // weighted class frequencies of the visible rows
        let parent_class_freq = data.class_frequencies(mask);
        let prediction = data.classes[find_modal_class(&parent_class_freq)].clone();

        // too light to split, or deep enough
        if (mask.nsamples as f32) < hyperparameters.min_weight_split()
            || hyperparameters
                .max_depth()
                .map(|max_depth| depth >= max_depth)
                .unwrap_or(false)
        {
            return Self::empty_leaf(prediction, depth);
        }

        let parent_score = impurity(hyperparameters.split_quality(), &parent_class_freq);
        let best = sorted_indices
            .iter()
            .enumerate()
            .filter_map(|(feature_idx, sorted_index)| {
                best_split_of_feature(data, mask, hyperparameters, &parent_class_freq, sorted_index)
                    .map(|(split_value, score)| (feature_idx, split_value, score))
            })
            .fold(None, |best, candidate| match best {
                Some((_, _, best_score)) if best_score <= candidate.2 => best,
                _ => Some(candidate),
            });

        // splits below min_impurity_decrease leave the node a leaf
        let (best_feature_idx, best_split_value, impurity_decrease) = match best {
            Some((feature_idx, split_value, score)) => {
                let decrease = F::cast(parent_score - score);
                if decrease < hyperparameters.min_impurity_decrease() {
                    return Self::empty_leaf(prediction, depth);
                }
                (feature_idx, split_value, decrease)
            }
            None => return Self::empty_leaf(prediction, depth),
        };

        // route the visible rows to the children
        let nsamples = mask.mask.len();
        let mut left_mask = RowMask::none(nsamples);
        let mut right_mask = RowMask::none(nsamples);

        for i in (0..nsamples).filter(|i| mask.mask[*i]) {
            if data.records[(i, best_feature_idx)] <= best_split_value {
                left_mask.mark(i);
            } else {
                right_mask.mark(i);
            }
        }

        let fit_child = |child_mask: &RowMask| {
            if child_mask.nsamples > 0 {
                Some(Box::new(TreeNode::fit(
                    data,
                    child_mask,
                    hyperparameters,
                    sorted_indices,
                    depth + 1,
                )))
            } else {
                None
            }
        };
        let left_child = fit_child(&left_mask);
        let right_child = fit_child(&right_mask);

        let leaf_node = left_child.is_none() || right_child.is_none();

        TreeNode {
            feature_idx: best_feature_idx,
            feature_name: sorted_indices[best_feature_idx].feature_name.to_owned(),
            split_value: best_split_value,
            impurity_decrease,
            left_child,
            right_child,
            leaf_node,
            prediction,
            depth,
        }
    }

    /// Collapse subtrees whose leaves all predict the same label
    ///
    /// Returns the common prediction of the subtree, if any.
    fn prune(&mut self) -> Option<L> {
        if self.is_leaf() {
            return Some(self.prediction.clone());
        }

        let left = self.left_child.as_mut().and_then(|x| x.prune());
        let right = self.right_child.as_mut().and_then(|x| x.prune());

        match (left, right) {
            (Some(x), Some(y)) if x == y => {
                self.prediction = x.clone();
                self.right_child = None;
                self.left_child = None;
                self.leaf_node = true;

                Some(x)
            }
            _ => None,
        }
    }
}

/// Scan the observations sorted by a single feature and return the best threshold on it
///
/// All visible observations start in the right subtree and are moved one by one to the left
/// subtree. Every position between two distinct values is a candidate threshold, placed at the
/// midpoint of the two values. Returns `(split_value, weighted impurity)` of the best candidate.
fn best_split_of_feature<F: Float, L: Label>(
    data: &TrainingSet<F, L>,
    mask: &RowMask,
    hyperparameters: &DecisionTreeValidParams<F, L>,
    parent_class_freq: &[f32],
    sorted_index: &SortedIndex<F>,
) -> Option<(F, f32)> {
    let visible = sorted_index
        .sorted_values
        .iter()
        .filter(|(idx, _)| mask.mask[*idx])
        .collect::<Vec<_>>();

    let total_weight = parent_class_freq.iter().sum::<f32>();
    let mut right_class_freq = parent_class_freq.to_vec();
    let mut left_class_freq = vec![0.0; parent_class_freq.len()];
    let mut weight_on_left_side = 0.0;

    let mut best: Option<(F, f32)> = None;
    for pair in visible.windows(2) {
        let (sample_idx, value) = *pair[0];
        let (_, next_value) = *pair[1];

        let class = data.class_of[sample_idx];
        let sample_weight = data.weights[sample_idx];
        right_class_freq[class] -= sample_weight;
        left_class_freq[class] += sample_weight;
        weight_on_left_side += sample_weight;
        let weight_on_right_side = total_weight - weight_on_left_side;

        // equal values have to end up in the same subtree
        if (next_value - value).abs() < F::cast(1e-5) {
            continue;
        }

        if weight_on_right_side < hyperparameters.min_weight_leaf()
            || weight_on_left_side < hyperparameters.min_weight_leaf()
        {
            continue;
        }

        let quality = hyperparameters.split_quality();
        let w = weight_on_left_side / total_weight;
        let score = w * impurity(quality, &left_class_freq)
            + (1.0 - w) * impurity(quality, &right_class_freq);

        if best.map(|(_, best_score)| score < best_score).unwrap_or(true) {
            best = Some(((value + next_value) / F::cast(2.0), score));
        }
    }

    best
}

/// Binary classification tree
///
/// Internal nodes hold a feature and a threshold. Rows with `feature <= threshold` go left, the
/// others go right. Leaves predict the most frequent label of the training rows that reached
/// them.
///
/// Fitting is greedy: every node tries the best threshold of every feature, keeps the one with
/// the lowest weighted child impurity and recurses, unless the node is too light, too deep or
/// no split improves the impurity by `min_impurity_decrease`. Equally frequent labels resolve
/// to the one seen first in the training targets, so fitting is deterministic.
///
/// ### Example
///
/// ```rust
/// use qfarm_trees::DecisionTree;
/// use qfarm::prelude::*;
///
/// let dataset = qfarm_datasets::advisory();
/// let tree = DecisionTree::params().fit(&dataset).unwrap();
///
/// // a fully grown tree reproduces its training table
/// let accuracy = tree.predict(&dataset).confusion_matrix(&dataset).unwrap().accuracy();
/// assert!((accuracy - 1.0).abs() < 1e-6);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone)]
pub struct DecisionTree<F: Float, L: Label> {
    root_node: TreeNode<F, L>,
    num_features: usize,
}

impl<F: Float, L: Label + Default, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<L>>
    for DecisionTree<F, L>
{
    /// Predict a label for every row of `x`
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = make_prediction(&row, &self.root_node);
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::default(x.nrows())
    }
}

impl<F: Float, L: Label, D, T> Fit<ArrayBase<D, Ix2>, T, Error> for DecisionTreeValidParams<F, L>
where
    D: Data<Elem = F>,
    T: AsTargets<Elem = L>,
{
    type Object = DecisionTree<F, L>;

    /// Grow a tree on the records and targets of `dataset`
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        if x.nrows() == 0 {
            return Err(Error::NotEnoughSamples);
        }

        let targets = dataset.targets().as_targets();
        if targets.len() != x.nrows() {
            return Err(Error::MismatchedShapes {
                expected: x.nrows(),
                found: targets.len(),
            });
        }

        let classes = dataset.targets().labels();
        let lookup = classes
            .iter()
            .enumerate()
            .map(|(idx, label)| (label, idx))
            .collect::<HashMap<_, _>>();
        let training_set = TrainingSet {
            records: x.view(),
            class_of: targets.iter().map(|label| lookup[label]).collect(),
            weights: (0..x.nrows()).map(|i| dataset.weight_for(i)).collect(),
            classes: classes.clone(),
        };

        let feature_names = dataset.feature_names();
        let sorted_indices: Vec<_> = (0..(x.ncols()))
            .map(|feature_idx| {
                SortedIndex::of_array_column(x, feature_idx, &feature_names[feature_idx])
            })
            .collect();

        let mut root_node = TreeNode::fit(
            &training_set,
            &RowMask::all(x.nrows()),
            self,
            &sorted_indices,
            0,
        );
        root_node.prune();

        Ok(DecisionTree {
            root_node,
            num_features: x.ncols(),
        })
    }
}

impl<F: Float, L: Label> DecisionTree<F, L> {
    /// Nodes in breadth-first order
    pub fn iter_nodes(&self) -> NodeIter<F, L> {
        NodeIter::new(&self.root_node)
    }

    /// Indices of the features used by some split, ascending
    pub fn features(&self) -> Vec<usize> {
        let mut fitted_features = self
            .iter_nodes()
            .filter(|node| !node.is_leaf())
            .map(|node| node.feature_idx)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        fitted_features.sort_unstable();

        fitted_features
    }

    /// Average impurity decrease of the splits on every feature
    pub fn mean_impurity_decrease(&self) -> Vec<F> {
        let mut impurity_decrease = vec![F::zero(); self.num_features];
        let mut num_nodes = vec![0; self.num_features];

        for node in self.iter_nodes().filter(|node| !node.leaf_node) {
            let idx = node.feature_idx;
            impurity_decrease[idx] = impurity_decrease[idx] + node.impurity_decrease;
            num_nodes[node.feature_idx] += 1;
        }

        impurity_decrease
            .into_iter()
            .zip(num_nodes.into_iter())
            .map(|(val, n)| if n == 0 { F::zero() } else { val / F::cast(n) })
            .collect()
    }

    /// Mean impurity decrease of every feature, scaled to sum to one
    ///
    /// A tree without any split (a single leaf) has no important feature and returns zeros.
    pub fn relative_impurity_decrease(&self) -> Vec<F> {
        let mean_impurity_decrease = self.mean_impurity_decrease();
        let sum: F = mean_impurity_decrease.iter().cloned().sum();
        if sum <= F::zero() {
            return mean_impurity_decrease;
        }

        mean_impurity_decrease
            .into_iter()
            .map(|x| x / sum)
            .collect()
    }

    /// Same as [`relative_impurity_decrease`](Self::relative_impurity_decrease)
    pub fn feature_importance(&self) -> Vec<F> {
        self.relative_impurity_decrease()
    }

    pub fn root_node(&self) -> &TreeNode<F, L> {
        &self.root_node
    }

    /// Depth of the deepest node
    pub fn max_depth(&self) -> usize {
        self.iter_nodes()
            .fold(0, |max, node| usize::max(max, node.depth))
    }

    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }

    /// Number of columns of the training records
    pub fn num_features(&self) -> usize {
        self.num_features
    }
}

/// Walk from `node` down to a leaf along the splits satisfied by `x`
fn make_prediction<F: Float, L: Label>(
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    node: &TreeNode<F, L>,
) -> L {
    match (&node.left_child, &node.right_child) {
        (Some(left), Some(right)) if !node.leaf_node => {
            if x[node.feature_idx] <= node.split_value {
                make_prediction(x, left)
            } else {
                make_prediction(x, right)
            }
        }
        _ => node.prediction.clone(),
    }
}

/// Finds the index of the most frequent class. If two classes have the same weight then the
/// class with the lower index, i.e. the one seen first in the targets, is returned.
fn find_modal_class(class_freq: &[f32]) -> usize {
    class_freq
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_idx, best_freq), (idx, freq)| {
            if *freq > best_freq {
                (idx, *freq)
            } else {
                (best_idx, best_freq)
            }
        })
        .0
}

fn impurity(quality: SplitQuality, class_freq: &[f32]) -> f32 {
    match quality {
        SplitQuality::Gini => gini_impurity(class_freq),
        SplitQuality::Entropy => entropy(class_freq),
    }
}

/// Gini impurity of a node with the given class weights
fn gini_impurity(class_freq: &[f32]) -> f32 {
    let n_samples = class_freq.iter().sum::<f32>();
    if n_samples <= 0.0 {
        return 0.0;
    }

    let purity = class_freq
        .iter()
        .map(|x| x / n_samples)
        .map(|x| x * x)
        .sum::<f32>();

    1.0 - purity
}

/// Entropy in bits of a node with the given class weights
fn entropy(class_freq: &[f32]) -> f32 {
    let n_samples = class_freq.iter().sum::<f32>();
    if n_samples <= 0.0 {
        return 0.0;
    }

    class_freq
        .iter()
        .map(|x| x / n_samples)
        .map(|x| if x > 0.0 { -x * x.log2() } else { 0.0 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::{array, s, Array, Array1, Array2};
    use qfarm::{metrics::ToConfusionMatrix, Dataset, ParamGuard};
    use rand::rngs::SmallRng;

    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};

    #[test]
    fn modal_class_prefers_first_on_ties() {
        assert_eq!(find_modal_class(&[6.0, 2.0, 0.0]), 0);
        assert_eq!(find_modal_class(&[1.0, 3.0, 3.0]), 1);
    }

    #[test]
    fn gini_impurity_example() {
        // shares 3/4, 1/4 and 0: 1 - 9/16 - 1/16 = 0.375
        assert_abs_diff_eq!(gini_impurity(&[6.0, 2.0, 0.0]), 0.375, epsilon = 1e-5);
    }

    #[test]
    fn entropy_example() {
        // -3/4 log2(3/4) - 1/4 log2(1/4)
        assert_abs_diff_eq!(entropy(&[6.0, 2.0, 0.0]), 0.81127, epsilon = 1e-5);

        // pure node
        assert_abs_diff_eq!(entropy(&[8.0, 0.0, 0.0]), 0.0, epsilon = 1e-5);
    }

    #[test]
    /// Feature 8 decides the target, all others are noise
    fn single_feature_random_noise_binary() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut data = Array::random_using((50, 10), Uniform::new(-4., 4.), &mut rng);
        data.slice_mut(s![.., 8]).assign(
            &(0..50)
                .map(|x| if x < 25 { 0.0 } else { 1.0 })
                .collect::<Array1<_>>(),
        );

        let targets = (0..50).map(|x| x < 25).collect::<Array1<_>>();
        let dataset = Dataset::new(data, targets);

        let model = DecisionTree::params().max_depth(Some(2)).fit(&dataset)?;

        assert_eq!(&model.features(), &[8]);

        let ground_truth = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];

        for (imp, truth) in model.feature_importance().iter().zip(&ground_truth) {
            assert_abs_diff_eq!(imp, truth, epsilon = 1e-15);
        }

        let cm = model
            .predict(dataset.records())
            .confusion_matrix(&dataset)?;
        assert_abs_diff_eq!(cm.accuracy(), 1.0, epsilon = 1e-15);

        Ok(())
    }

    #[test]
    /// Random targets grow the tree to exactly the depth limit
    fn check_max_depth() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);

        let data = Array::random_using((50, 50), Uniform::new(-1., 1.), &mut rng);
        let targets = (0..50).collect::<Array1<usize>>();

        let dataset = Dataset::new(data, targets);

        for max_depth in &[1, 5] {
            let model = DecisionTree::params()
                .max_depth(Some(*max_depth))
                .min_impurity_decrease(1e-10f64)
                .min_weight_split(1e-10)
                .fit(&dataset)?;
            assert_eq!(model.max_depth(), *max_depth);
        }

        Ok(())
    }

    #[test]
    /// The second column separates the three rows
    fn perfectly_separable_small() -> Result<()> {
        let data = array![[1., 2., 3.], [1., 2., 4.], [1., 3., 3.5]];
        let targets = array![0usize, 0, 1];

        let dataset = Dataset::new(data.clone(), targets);
        let model = DecisionTree::params().max_depth(Some(1)).fit(&dataset)?;

        assert_eq!(model.predict(&data), array![0, 0, 1]);

        Ok(())
    }

    #[test]
    /// Multilabel classification on four well separated clusters
    fn multilabel_four_uniform() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut data = Array2::random_using((40, 2), Uniform::new(-1., 1.), &mut rng);

        data.outer_iter_mut().enumerate().for_each(|(i, mut p)| {
            if i < 10 {
                p += &array![-2., -2.]
            } else if i < 20 {
                p += &array![-2., 2.];
            } else if i < 30 {
                p += &array![2., -2.];
            } else {
                p += &array![2., 2.];
            }
        });

        let targets = (0..40).map(|x| x / 10).collect::<Array1<usize>>();
        let dataset = Dataset::new(data.clone(), targets);

        let model = DecisionTree::params().fit(&dataset)?;
        let prediction = model.predict(data);

        let cm = prediction.confusion_matrix(&dataset)?;
        assert!(cm.accuracy() > 0.99);
        assert_eq!(model.num_leaves(), 4);

        Ok(())
    }

    #[test]
    fn string_labels_on_the_advisory_table() -> Result<()> {
        let dataset = qfarm_datasets::advisory();
        let names = dataset.target_names().to_vec();
        let dataset = dataset.map_targets(|class| names[*class].clone());

        let model = DecisionTree::params().fit(&dataset)?;
        let prediction = model.predict(dataset.records());

        assert_eq!(prediction.to_vec(), dataset.targets().to_vec());

        Ok(())
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset = Dataset::new(Array2::<f64>::zeros((0, 3)), Array1::<usize>::zeros(0));

        assert!(DecisionTree::params().fit(&dataset).is_err());
    }

    #[test]
    #[should_panic]
    /// A non-positive impurity threshold is rejected
    fn panic_min_impurity_decrease() {
        DecisionTree::<f64, bool>::params()
            .min_impurity_decrease(0.0)
            .check()
            .unwrap();
    }
}
