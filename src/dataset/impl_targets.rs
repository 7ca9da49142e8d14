use super::{AsTargets, Label, Labels};
use ndarray::{ArrayBase, ArrayView1, Data, Ix1};

/// A one-dimensional ndarray can act as targets
impl<L, S: Data<Elem = L>> AsTargets for ArrayBase<S, Ix1> {
    type Elem = L;

    fn as_targets(&self) -> ArrayView1<L> {
        self.view()
    }
}

/// Targets with discrete elements can act as labels
impl<L: Label, T: AsTargets<Elem = L>> Labels for T {
    type Elem = L;

    fn labels(&self) -> Vec<L> {
        let mut labels = Vec::new();
        for label in self.as_targets().iter() {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }

        labels
    }
}

