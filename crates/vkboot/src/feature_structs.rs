//! Flag counts of the extended feature structs `ash` defines.
//!
//! Structs with an odd number of flags end in four bytes of padding, which
//! must never be read as a flag. Each count is checked against the struct
//! size when a [`FeatureNode`](crate::FeatureNode) is built.

use crate::feature_chain::FeatureStruct;
use ash::vk;

macro_rules! feature_structs {
    ($($name:ident => $count:literal,)*) => {
        $(
            // SAFETY: every field after `p_next` is a `VkBool32`, and there are `$count` of them.
            unsafe impl FeatureStruct for vk::$name<'_> {
                const FLAG_COUNT: usize = $count;
            }
        )*
    };
}

feature_structs! {
    PhysicalDevice16BitStorageFeatures => 4,
    PhysicalDevice4444FormatsFeaturesEXT => 2,
    PhysicalDevice8BitStorageFeatures => 3,
    PhysicalDeviceASTCDecodeFeaturesEXT => 1,
    PhysicalDeviceAccelerationStructureFeaturesKHR => 5,
    PhysicalDeviceAddressBindingReportFeaturesEXT => 1,
    PhysicalDeviceAmigoProfilingFeaturesSEC => 1,
    PhysicalDeviceBlendOperationAdvancedFeaturesEXT => 1,
    PhysicalDeviceBorderColorSwizzleFeaturesEXT => 2,
    PhysicalDeviceBufferDeviceAddressFeatures => 3,
    PhysicalDeviceBufferDeviceAddressFeaturesEXT => 3,
    PhysicalDeviceCoherentMemoryFeaturesAMD => 1,
    PhysicalDeviceColorWriteEnableFeaturesEXT => 1,
    PhysicalDeviceConditionalRenderingFeaturesEXT => 2,
    PhysicalDeviceCooperativeMatrixFeaturesKHR => 2,
    PhysicalDeviceCooperativeMatrixFeaturesNV => 2,
    PhysicalDeviceCopyMemoryIndirectFeaturesNV => 1,
    PhysicalDeviceCornerSampledImageFeaturesNV => 1,
    PhysicalDeviceCoverageReductionModeFeaturesNV => 1,
    PhysicalDeviceCubicClampFeaturesQCOM => 1,
    PhysicalDeviceCubicWeightsFeaturesQCOM => 1,
    PhysicalDeviceCudaKernelLaunchFeaturesNV => 1,
    PhysicalDeviceCustomBorderColorFeaturesEXT => 2,
    PhysicalDeviceDepthBiasControlFeaturesEXT => 4,
    PhysicalDeviceDepthClampZeroOneFeaturesEXT => 1,
    PhysicalDeviceDepthClipControlFeaturesEXT => 1,
    PhysicalDeviceDepthClipEnableFeaturesEXT => 1,
    PhysicalDeviceDescriptorBufferFeaturesEXT => 4,
    PhysicalDeviceDescriptorIndexingFeatures => 20,
    PhysicalDeviceDeviceGeneratedCommandsFeaturesNV => 1,
    PhysicalDeviceDeviceMemoryReportFeaturesEXT => 1,
    PhysicalDeviceDiagnosticsConfigFeaturesNV => 1,
    PhysicalDeviceDisplacementMicromapFeaturesNV => 1,
    PhysicalDeviceDynamicRenderingFeatures => 1,
    PhysicalDeviceExclusiveScissorFeaturesNV => 1,
    PhysicalDeviceExtendedDynamicState2FeaturesEXT => 3,
    PhysicalDeviceExtendedDynamicState3FeaturesEXT => 31,
    PhysicalDeviceExtendedDynamicStateFeaturesEXT => 1,
    PhysicalDeviceExternalMemoryRDMAFeaturesNV => 1,
    PhysicalDeviceFaultFeaturesEXT => 2,
    PhysicalDeviceFragmentDensityMap2FeaturesEXT => 1,
    PhysicalDeviceFragmentDensityMapFeaturesEXT => 3,
    PhysicalDeviceFragmentShadingRateFeaturesKHR => 3,
    PhysicalDeviceFrameBoundaryFeaturesEXT => 1,
    PhysicalDeviceGlobalPriorityQueryFeaturesKHR => 1,
    PhysicalDeviceHostImageCopyFeaturesEXT => 1,
    PhysicalDeviceHostQueryResetFeatures => 1,
    PhysicalDeviceImage2DViewOf3DFeaturesEXT => 2,
    PhysicalDeviceImageProcessing2FeaturesQCOM => 1,
    PhysicalDeviceImageProcessingFeaturesQCOM => 3,
    PhysicalDeviceImageRobustnessFeatures => 1,
    PhysicalDeviceImageSlicedViewOf3DFeaturesEXT => 1,
    PhysicalDeviceImageViewMinLodFeaturesEXT => 1,
    PhysicalDeviceImagelessFramebufferFeatures => 1,
    PhysicalDeviceIndexTypeUint8FeaturesKHR => 1,
    PhysicalDeviceInlineUniformBlockFeatures => 2,
    PhysicalDeviceInvocationMaskFeaturesHUAWEI => 1,
    PhysicalDeviceLegacyDitheringFeaturesEXT => 1,
    PhysicalDeviceLineRasterizationFeaturesKHR => 6,
    PhysicalDeviceLinearColorAttachmentFeaturesNV => 1,
    PhysicalDeviceMaintenance4Features => 1,
    PhysicalDeviceMaintenance5FeaturesKHR => 1,
    PhysicalDeviceMaintenance6FeaturesKHR => 1,
    PhysicalDeviceMapMemoryPlacedFeaturesEXT => 3,
    PhysicalDeviceMemoryDecompressionFeaturesNV => 1,
    PhysicalDeviceMemoryPriorityFeaturesEXT => 1,
    PhysicalDeviceMeshShaderFeaturesEXT => 5,
    PhysicalDeviceMeshShaderFeaturesNV => 2,
    PhysicalDeviceMultiDrawFeaturesEXT => 1,
    PhysicalDeviceMultiviewFeatures => 3,
    PhysicalDeviceMutableDescriptorTypeFeaturesEXT => 1,
    PhysicalDeviceNestedCommandBufferFeaturesEXT => 3,
    PhysicalDeviceNonSeamlessCubeMapFeaturesEXT => 1,
    PhysicalDeviceOpacityMicromapFeaturesEXT => 3,
    PhysicalDeviceOpticalFlowFeaturesNV => 1,
    PhysicalDevicePerStageDescriptorSetFeaturesNV => 2,
    PhysicalDevicePerformanceQueryFeaturesKHR => 2,
    PhysicalDevicePipelinePropertiesFeaturesEXT => 1,
    PhysicalDevicePipelineRobustnessFeaturesEXT => 1,
    PhysicalDevicePortabilitySubsetFeaturesKHR => 15,
    PhysicalDevicePresentBarrierFeaturesNV => 1,
    PhysicalDevicePresentIdFeaturesKHR => 1,
    PhysicalDevicePresentWaitFeaturesKHR => 1,
    PhysicalDevicePrivateDataFeatures => 1,
    PhysicalDeviceProtectedMemoryFeatures => 1,
    PhysicalDeviceProvokingVertexFeaturesEXT => 2,
    PhysicalDeviceRGBA10X6FormatsFeaturesEXT => 1,
    PhysicalDeviceRawAccessChainsFeaturesNV => 1,
    PhysicalDeviceRayQueryFeaturesKHR => 1,
    PhysicalDeviceRayTracingMaintenance1FeaturesKHR => 2,
    PhysicalDeviceRayTracingMotionBlurFeaturesNV => 2,
    PhysicalDeviceRayTracingPipelineFeaturesKHR => 5,
    PhysicalDeviceRayTracingValidationFeaturesNV => 1,
    PhysicalDeviceRenderPassStripedFeaturesARM => 1,
    PhysicalDeviceRobustness2FeaturesEXT => 3,
    PhysicalDeviceSamplerYcbcrConversionFeatures => 1,
    PhysicalDeviceScalarBlockLayoutFeatures => 1,
    PhysicalDeviceSchedulingControlsFeaturesARM => 1,
    PhysicalDeviceShaderAtomicFloat2FeaturesEXT => 12,
    PhysicalDeviceShaderAtomicFloatFeaturesEXT => 12,
    PhysicalDeviceShaderAtomicInt64Features => 2,
    PhysicalDeviceShaderClockFeaturesKHR => 2,
    PhysicalDeviceShaderCoreBuiltinsFeaturesARM => 1,
    PhysicalDeviceShaderDrawParametersFeatures => 1,
    PhysicalDeviceShaderEnqueueFeaturesAMDX => 1,
    PhysicalDeviceShaderExpectAssumeFeaturesKHR => 1,
    PhysicalDeviceShaderFloat16Int8Features => 2,
    PhysicalDeviceShaderFloatControls2FeaturesKHR => 1,
    PhysicalDeviceShaderImageAtomicInt64FeaturesEXT => 2,
    PhysicalDeviceShaderImageFootprintFeaturesNV => 1,
    PhysicalDeviceShaderIntegerDotProductFeatures => 1,
    PhysicalDeviceShaderModuleIdentifierFeaturesEXT => 1,
    PhysicalDeviceShaderObjectFeaturesEXT => 1,
    PhysicalDeviceShaderQuadControlFeaturesKHR => 1,
    PhysicalDeviceShaderSMBuiltinsFeaturesNV => 1,
    PhysicalDeviceShaderSubgroupRotateFeaturesKHR => 2,
    PhysicalDeviceShaderTerminateInvocationFeatures => 1,
    PhysicalDeviceShaderTileImageFeaturesEXT => 3,
    PhysicalDeviceShadingRateImageFeaturesNV => 2,
    PhysicalDeviceSubgroupSizeControlFeatures => 2,
    PhysicalDeviceSubpassMergeFeedbackFeaturesEXT => 1,
    PhysicalDeviceSubpassShadingFeaturesHUAWEI => 1,
    PhysicalDeviceSwapchainMaintenance1FeaturesEXT => 1,
    PhysicalDeviceSynchronization2Features => 1,
    PhysicalDeviceTexelBufferAlignmentFeaturesEXT => 1,
    PhysicalDeviceTextureCompressionASTCHDRFeatures => 1,
    PhysicalDeviceTilePropertiesFeaturesQCOM => 1,
    PhysicalDeviceTimelineSemaphoreFeatures => 1,
    PhysicalDeviceTransformFeedbackFeaturesEXT => 2,
    PhysicalDeviceVariablePointersFeatures => 2,
    PhysicalDeviceVertexAttributeDivisorFeaturesKHR => 2,
    PhysicalDeviceVideoMaintenance1FeaturesKHR => 1,
    PhysicalDeviceVulkan11Features => 12,
    PhysicalDeviceVulkan12Features => 47,
    PhysicalDeviceVulkan13Features => 15,
    PhysicalDeviceVulkanMemoryModelFeatures => 3,
    PhysicalDeviceYcbcr2Plane444FormatsFeaturesEXT => 1,
    PhysicalDeviceYcbcrDegammaFeaturesQCOM => 1,
    PhysicalDeviceYcbcrImageArraysFeaturesEXT => 1,
}
