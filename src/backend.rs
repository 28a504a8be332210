//! The backends the binaries run on. `NdArray` on the CPU by default, LibTorch with the `tch`
//! feature.

use burn::backend::Autodiff;

#[cfg(not(feature = "tch"))]
/// The backend used for inference
pub type InferenceBackend = burn::backend::NdArray;

#[cfg(feature = "tch")]
/// The backend used for inference
pub type InferenceBackend = burn::backend::LibTorch;

/// The backend used for training
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// The device the binaries compute on
#[cfg(not(feature = "tch"))]
pub fn default_device() -> burn::backend::ndarray::NdArrayDevice {
    burn::backend::ndarray::NdArrayDevice::Cpu
}

/// The device the binaries compute on
#[cfg(feature = "tch")]
pub fn default_device() -> burn::backend::libtorch::LibTorchDevice {
    burn::backend::libtorch::LibTorchDevice::Cuda(0)
}
