//! 一站式导入.
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::coords::elastic::noise_field;
pub use crate::coords::rotation::{
    random_rotation_matrix, rotation_matrix_2d, rotation_matrix_3d, rotation_matrix_x_3d,
    rotation_matrix_y_3d, rotation_matrix_z_3d,
};
pub use crate::coords::{AbsoluteCoords, CenteredCoords};

pub use crate::filter::{gaussian_filter, gaussian_gradient_magnitude, BoundaryMode};
pub use crate::interp::{map_coordinates, resize, resize_nearest};

pub use crate::seg::bbox::{
    label_components, seg_to_bounding_boxes, BoundingBoxBatch, NonzeroGating,
};
pub use crate::seg::{
    one_hot_decode, one_hot_encode, resize_segmentation, resize_softmax, unique_labels,
};

#[cfg(feature = "rayon")]
pub use crate::seg::par_resize_softmax;

pub use crate::crop::{center_crop, pad_to_shape, random_crop};
pub use crate::intensity::{color_constancy_normalize, illumination_jitter, MinkNorm};

pub use crate::consts::DEFAULT_N_MAX_GT;
pub use crate::{AugError, RandomSource, RangeVal, SamplingKind};

#[cfg(test)]
mod tests {
    /// 预导出的路径必须全部可达且指向正确的实现.
    #[test]
    fn test_prelude_paths_reachable() {
        use crate::prelude::*;

        let m = rotation_matrix_2d(0.0);
        assert_eq!(m[[0, 0]], 1.0);
        assert_eq!(m[[0, 1]], 0.0);

        let mesh = CenteredCoords::mesh(&[3, 3]);
        assert_eq!(mesh.spatial_shape(), &[3, 3]);
        assert_eq!(DEFAULT_N_MAX_GT, 3);
    }
}
