use burn::{
    module::Param,
    tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor},
};

/// Build a `[rows, width]` Int tensor from a rectangular grid of ids
pub fn id_grid<B: Backend>(
    grid: &[Vec<usize>],
    width: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let rows = grid.len();

    Tensor::from_data(
        Data::new(
            grid.iter()
                .flat_map(|row| row.iter().map(|id| (*id as i64).elem::<B::IntElem>()))
                .collect(),
            Shape::new([rows, width]),
        ),
        device,
    )
}

/// Build a `[rows, width]` float tensor holding 1.0 for real positions and 0.0 for padding
pub fn mask_grid<B: Backend>(
    grid: &[Vec<bool>],
    width: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let rows = grid.len();

    Tensor::from_data(
        Data::new(
            grid.iter()
                .flat_map(|row| {
                    row.iter().map(|real| {
                        let value: f32 = if *real { 1.0 } else { 0.0 };
                        value.elem::<B::FloatElem>()
                    })
                })
                .collect(),
            Shape::new([rows, width]),
        ),
        device,
    )
}

/// Build a 1D Int tensor of class ids
pub fn class_ids<B: Backend>(ids: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    Tensor::from_data(
        Data::new(
            ids.iter().map(|id| (*id as i64).elem::<B::IntElem>()).collect(),
            Shape::new([ids.len()]),
        ),
        device,
    )
}

/// Wrap host values of the given shape into a trainable parameter
pub fn param<B: Backend, const D: usize>(
    values: Vec<f32>,
    shape: [usize; D],
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    let tensor = Tensor::from_data(Data::new(values, Shape::new(shape)).convert::<B::FloatElem>(), device);

    Param::from_tensor(tensor)
}

/// Copy a float tensor's values back to the host
pub fn to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
    tensor.into_data().convert::<f32>().value
}
